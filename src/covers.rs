use std::time::Duration;

use anyhow::Context as _;

use crate::catalog::{Book, Catalog, CatalogStore, FileStore};
use crate::cli::CoversArgs;
use crate::google_books::GoogleBooks;
use crate::http::FetchError;

/// Looks up a cover image for a title/author pair.
pub trait CoverSource {
    /// `Ok(None)` means the source answered but had no image.
    fn find_cover(&self, title: &str, author: &str) -> Result<Option<String>, FetchError>;
}

#[derive(Debug)]
pub enum CoverOutcome {
    Updated(String),
    Unchanged,
    NoCover,
    Failed(FetchError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub updated: usize,
    pub unchanged: usize,
    pub no_cover: usize,
    pub failed: usize,
    pub saved: bool,
}

impl BackfillReport {
    fn record(&mut self, outcome: &CoverOutcome) {
        match outcome {
            CoverOutcome::Updated(_) => self.updated += 1,
            CoverOutcome::Unchanged => self.unchanged += 1,
            CoverOutcome::NoCover => self.no_cover += 1,
            CoverOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn processed(&self) -> usize {
        self.updated + self.unchanged + self.no_cover + self.failed
    }
}

pub fn run(catalog_path: &str, args: CoversArgs) -> anyhow::Result<()> {
    let store = FileStore::new(catalog_path);
    let source = GoogleBooks::new(&args.books_api_url, Duration::from_secs(args.timeout_secs))
        .context("build books api client")?;

    tracing::info!(catalog = %store.location(), "starting cover update");
    let report = backfill_store(&store, &source, Duration::from_millis(args.delay_ms))?;

    if report.saved {
        println!("Done! Updated {} book covers.", report.updated);
    } else {
        println!("Done! No updates needed.");
    }
    Ok(())
}

/// Runs the backfill and saves only when at least one cover changed.
pub fn backfill_store(
    store: &dyn CatalogStore,
    source: &dyn CoverSource,
    delay: Duration,
) -> anyhow::Result<BackfillReport> {
    let mut catalog = store.load().context("load catalog")?;
    let mut report = backfill_catalog(&mut catalog, source, delay);

    tracing::info!(
        updated = report.updated,
        unchanged = report.unchanged,
        no_cover = report.no_cover,
        failed = report.failed,
        "cover update finished"
    );

    if report.updated > 0 {
        store
            .save(&catalog)
            .with_context(|| format!("save catalog: {}", store.location()))?;
        report.saved = true;
    }
    Ok(report)
}

pub fn backfill_catalog(
    catalog: &mut Catalog,
    source: &dyn CoverSource,
    delay: Duration,
) -> BackfillReport {
    let total = catalog.book_count();
    let mut report = BackfillReport::default();

    for niche in &mut catalog.niches {
        tracing::info!(niche = %niche.title, "processing niche");
        for book in &mut niche.books {
            if report.processed() > 0 && !delay.is_zero() {
                std::thread::sleep(delay);
            }

            tracing::info!(
                "[{}/{}] checking: {} by {}",
                report.processed() + 1,
                total,
                book.title,
                book.author
            );
            let outcome = backfill_book(book, source);
            match &outcome {
                CoverOutcome::Updated(url) => tracing::info!(url = %url, "updated cover"),
                CoverOutcome::Unchanged => tracing::debug!("cover already current"),
                CoverOutcome::NoCover => tracing::info!("no cover found"),
                CoverOutcome::Failed(err) => {
                    tracing::warn!(title = %book.title, error = %err, "cover lookup failed")
                }
            }
            report.record(&outcome);
        }
    }

    report
}

pub fn backfill_book(book: &mut Book, source: &dyn CoverSource) -> CoverOutcome {
    let found = match source.find_cover(&book.title, &book.author) {
        Ok(Some(url)) => url,
        Ok(None) => return CoverOutcome::NoCover,
        Err(err) => return CoverOutcome::Failed(err),
    };

    let url = upgrade_cover_url(&found);
    if url == book.image_url {
        return CoverOutcome::Unchanged;
    }
    book.image_url = url.clone();
    CoverOutcome::Updated(url)
}

/// Requests a larger render for `zoom=1` thumbnails and forces https.
///
/// `edge=curl` is dropped only alongside the zoom upgrade.
pub fn upgrade_cover_url(url: &str) -> String {
    let url = match url.split_once('?') {
        Some((base, query)) => {
            let params: Vec<&str> = query.split('&').collect();
            if params.contains(&"zoom=1") {
                let params = params
                    .into_iter()
                    .filter(|param| *param != "edge=curl")
                    .map(|param| if param == "zoom=1" { "zoom=2" } else { param })
                    .collect::<Vec<_>>();
                format!("{base}?{}", params.join("&"))
            } else {
                url.to_owned()
            }
        }
        None => url.to_owned(),
    };

    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url,
    }
}
