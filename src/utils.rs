//! Small English-rendering helpers shared by questions, annotations, and
//! error messages.

/// "a", "a or b", "a, b, or c".
pub fn or_join<I: IntoIterator<Item = String>>(items: I) -> String {
    join_with(items, "or")
}

fn join_with<I: IntoIterator<Item = String>>(items: I, word: &str) -> String {
    let items: Vec<String> = items.into_iter().collect();
    match &items[..] {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} {word} {second}"),
        [init @ .., last] => format!("{} {word} {last}", init.join(", ")),
    }
}
