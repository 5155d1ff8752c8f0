use autodocs::catalog::CatalogRecord;
use autodocs::download::{DownloadPlan, Downloader, output_path, resolve_href};
use autodocs::fetch::{FetchError, Fetcher};
use autodocs::matcher::TypeFilter;
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Default)]
struct MapFetcher {
    pages: HashMap<String, Vec<u8>>,
    calls: RefCell<Vec<String>>,
}

impl MapFetcher {
    fn with(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.as_bytes().to_vec());
        self
    }
}

impl Fetcher for MapFetcher {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.borrow_mut().push(url.to_string());
        self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

const LISTING: &str = r#"<table>
  <tr><td>US1</td><td><a href="http://site/detail/7">ISIN-X</a><a href="http://site/kid/7">KID-en</a></td></tr>
  <tr><td>US2</td><td><a href="http://site/detail/8">ISIN-Y</a></td></tr>
</table>"#;

const DETAIL: &str = r#"<table><tr><td><a href="http://site/files/7.pdf">Download</a></td></tr></table>"#;

fn fixture() -> (Vec<CatalogRecord>, Vec<String>, TypeFilter) {
    let catalog = vec![[("Id", "7"), ("Isin", "US1")].into_iter().collect()];
    (catalog, vec!["Isin".to_string()], TypeFilter::new(["ISIN"], "-"))
}

fn plan<'a>(catalog: &'a [CatalogRecord], columns: &'a [String], filter: &'a TypeFilter) -> DownloadPlan<'a> {
    DownloadPlan {
        catalog,
        columns,
        filter,
        id_column: "Id",
        download_label: "Download",
    }
}

#[test]
fn follows_listing_detail_and_binary() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MapFetcher::default()
        .with("http://site/list", LISTING)
        .with("http://site/detail/7", DETAIL)
        .with("http://site/files/7.pdf", "%PDF-1.4 seven");
    let (catalog, columns, filter) = fixture();

    let outcome = Downloader::new(&fetcher, dir.path())
        .run(&["http://site/list".to_string()], &plan(&catalog, &columns, &filter));

    let target = dir.path().join("7_ISIN.pdf");
    assert_eq!(outcome.pages_visited, 1);
    assert_eq!(outcome.saved, vec![target.clone()]);
    assert_eq!(std::fs::read(&target).unwrap(), b"%PDF-1.4 seven");
    assert_eq!(
        *fetcher.calls.borrow(),
        ["http://site/list", "http://site/detail/7", "http://site/files/7.pdf"]
    );
}

#[test]
fn rerun_overwrites_same_file() {
    let dir = tempfile::tempdir().unwrap();
    let (catalog, columns, filter) = fixture();
    let urls = ["http://site/list".to_string()];

    let first = MapFetcher::default()
        .with("http://site/list", LISTING)
        .with("http://site/detail/7", DETAIL)
        .with("http://site/files/7.pdf", "old");
    Downloader::new(&first, dir.path()).run(&urls, &plan(&catalog, &columns, &filter));

    let second = MapFetcher::default()
        .with("http://site/list", LISTING)
        .with("http://site/detail/7", DETAIL)
        .with("http://site/files/7.pdf", "new");
    let outcome = Downloader::new(&second, dir.path()).run(&urls, &plan(&catalog, &columns, &filter));

    assert_eq!(outcome.saved.len(), 1);
    assert_eq!(std::fs::read(dir.path().join("7_ISIN.pdf")).unwrap(), b"new");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn failed_page_does_not_stop_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MapFetcher::default()
        .with("http://site/list", LISTING)
        .with("http://site/detail/7", DETAIL)
        .with("http://site/files/7.pdf", "%PDF-");
    let (catalog, columns, filter) = fixture();
    let urls = ["http://site/missing".to_string(), "http://site/list".to_string()];

    let outcome = Downloader::new(&fetcher, dir.path()).run(&urls, &plan(&catalog, &columns, &filter));
    assert_eq!(outcome.pages_visited, 1);
    assert_eq!(outcome.saved.len(), 1);
}

#[test]
fn failed_binary_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MapFetcher::default()
        .with("http://site/list", LISTING)
        .with("http://site/detail/7", DETAIL);
    let (catalog, columns, filter) = fixture();

    let outcome = Downloader::new(&fetcher, dir.path())
        .run(&["http://site/list".to_string()], &plan(&catalog, &columns, &filter));
    assert_eq!(outcome.pages_visited, 1);
    assert!(outcome.saved.is_empty());
    assert!(!dir.path().join("7_ISIN.pdf").exists());
}

#[test]
fn relative_links_resolve_against_their_page() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MapFetcher::default()
        .with(
            "http://site/funds/list",
            r#"<table><tr><td>US1</td><td><a href="detail?id=7">ISIN-X</a></td></tr></table>"#,
        )
        .with(
            "http://site/funds/detail?id=7",
            r#"<table><tr><td><a href="/files/7.pdf">Download</a></td></tr></table>"#,
        )
        .with("http://site/files/7.pdf", "%PDF-");
    let (catalog, columns, filter) = fixture();

    let outcome = Downloader::new(&fetcher, dir.path())
        .run(&["http://site/funds/list".to_string()], &plan(&catalog, &columns, &filter));
    assert_eq!(outcome.saved, vec![dir.path().join("7_ISIN.pdf")]);
}

#[test]
fn resolve_pdf_links_reads_download_cells() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MapFetcher::default().with("http://site/detail/7", DETAIL);
    let links = Downloader::new(&fetcher, dir.path())
        .resolve_pdf_links("http://site/detail/7", "Download")
        .unwrap();
    assert_eq!(links, ["http://site/files/7.pdf"]);
}

#[test]
fn naming_and_href_helpers() {
    let dir = std::path::Path::new("downloaded");
    assert_eq!(output_path(dir, "7", "ISIN"), dir.join("7_ISIN.pdf"));
    assert_eq!(resolve_href("http://a/b/c", "d"), "http://a/b/d");
    assert_eq!(resolve_href("http://a/b/c", "https://x/y"), "https://x/y");
    assert_eq!(resolve_href("not a url", "rel"), "rel");
}

#[test]
fn several_download_links_report_one_file() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MapFetcher::default()
        .with("http://site/list", LISTING)
        .with(
            "http://site/detail/7",
            r#"<table>
  <tr><td><a href="http://site/files/7a.pdf">Download</a></td></tr>
  <tr><td><a href="http://site/files/7b.pdf">Download</a></td></tr>
</table>"#,
        )
        .with("http://site/files/7a.pdf", "first")
        .with("http://site/files/7b.pdf", "second");
    let (catalog, columns, filter) = fixture();

    let outcome = Downloader::new(&fetcher, dir.path())
        .run(&["http://site/list".to_string()], &plan(&catalog, &columns, &filter));

    let target = dir.path().join("7_ISIN.pdf");
    assert_eq!(outcome.saved, vec![target.clone()]);
    assert_eq!(std::fs::read(&target).unwrap(), b"second");
}

#[test]
fn record_without_id_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = MapFetcher::default()
        .with("http://site/list", LISTING)
        .with("http://site/detail/7", DETAIL)
        .with("http://site/files/7.pdf", "%PDF-");
    let catalog: Vec<CatalogRecord> = vec![[("Id", ""), ("Isin", "US1")].into_iter().collect()];
    let (_, columns, filter) = fixture();

    let outcome = Downloader::new(&fetcher, dir.path())
        .run(&["http://site/list".to_string()], &plan(&catalog, &columns, &filter));

    assert_eq!(outcome.pages_visited, 1);
    assert!(outcome.saved.is_empty());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    assert_eq!(*fetcher.calls.borrow(), ["http://site/list"]);
}

#[test]
fn pages_with_invalid_utf8_still_parse() {
    let dir = tempfile::tempdir().unwrap();
    let mut fetcher = MapFetcher::default()
        .with("http://site/detail/7", DETAIL)
        .with("http://site/files/7.pdf", "%PDF-");
    let mut listing = b"<table><tr><td>caf\xe9</td><td>US1</td><td>".to_vec();
    listing.extend_from_slice(br#"<a href="http://site/detail/7">ISIN-X</a></td></tr></table>"#);
    fetcher.pages.insert("http://site/list".to_string(), listing);
    let (catalog, columns, filter) = fixture();

    let outcome = Downloader::new(&fetcher, dir.path())
        .run(&["http://site/list".to_string()], &plan(&catalog, &columns, &filter));
    assert_eq!(outcome.saved, vec![dir.path().join("7_ISIN.pdf")]);
}
