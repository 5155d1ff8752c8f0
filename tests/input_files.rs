use autodocs::inputs::{read_base_url, read_urls_to_visit};
use autodocs::matcher::TypeFilter;

#[test]
fn urls_are_base_plus_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.txt");
    let visit = dir.path().join("visit.txt");
    std::fs::write(&base, "https://docs.example.com/funds\n").unwrap();
    std::fs::write(&visit, "/a?page=1\n\n  /b  \n").unwrap();

    let base_url = read_base_url(&base).unwrap();
    assert_eq!(base_url, "https://docs.example.com/funds");
    let urls = read_urls_to_visit(&visit, &base_url).unwrap();
    assert_eq!(
        urls,
        ["https://docs.example.com/funds/a?page=1", "https://docs.example.com/funds/b"]
    );
}

#[test]
fn types_file_loads_trimmed_entries() {
    let dir = tempfile::tempdir().unwrap();
    let types = dir.path().join("types.txt");
    std::fs::write(&types, "ISIN\r\nKID \n\n").unwrap();

    let filter = TypeFilter::load(&types, "-").unwrap();
    assert_eq!(filter.allowed.len(), 2);
    assert!(filter.accepts("KID-en"));
    assert!(!filter.accepts("KID -en"));
}

#[test]
fn missing_input_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(read_base_url(&dir.path().join("absent")).is_err());
}
