/// Canonical form used to compare table cell text with catalog values.
///
/// Splits on literal spaces and underscores, uppercases every segment and
/// joins them back with `_`. Empty segments survive, so `"a  b"` becomes
/// `"A__B"`.
pub fn normalize(text: &str) -> String {
    text.split([' ', '_'])
        .map(|seg| seg.to_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}
