use anyhow::Context as _;

use crate::catalog::{Catalog, CatalogStore, FileStore};
use crate::cli::RetagArgs;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetagReport {
    pub updated: usize,
    pub total: usize,
}

pub fn run(catalog_path: &str, args: RetagArgs) -> anyhow::Result<()> {
    let store = FileStore::new(catalog_path);
    let report = retag_store(&store, &args.old_tag, &args.new_tag)?;
    println!(
        "Updated {} of {} links to use tag: {}",
        report.updated, report.total, args.new_tag
    );
    Ok(())
}

/// Loads, rewrites and unconditionally saves the catalog.
pub fn retag_store(
    store: &dyn CatalogStore,
    old_tag: &str,
    new_tag: &str,
) -> anyhow::Result<RetagReport> {
    let mut catalog = store.load().context("load catalog")?;
    let report = retag_catalog(&mut catalog, old_tag, new_tag);
    tracing::info!(
        updated = report.updated,
        total = report.total,
        new_tag,
        "affiliate links rewritten"
    );
    store
        .save(&catalog)
        .with_context(|| format!("save catalog: {}", store.location()))?;
    Ok(report)
}

pub fn retag_catalog(catalog: &mut Catalog, old_tag: &str, new_tag: &str) -> RetagReport {
    let mut report = RetagReport::default();
    for book in catalog.books_mut() {
        report.total += 1;
        if let Some(link) = retag_link(&book.amazon_link, old_tag, new_tag) {
            tracing::debug!(title = %book.title, link = %link, "link retagged");
            book.amazon_link = link;
            report.updated += 1;
        }
    }
    report
}

/// Returns the rewritten link, or `None` when it should stay as is.
///
/// Any `tag=` substring counts as an existing tag, even outside the query.
pub fn retag_link(link: &str, old_tag: &str, new_tag: &str) -> Option<String> {
    if !old_tag.is_empty() && old_tag != new_tag && link.contains(old_tag) {
        return Some(link.replace(old_tag, new_tag));
    }
    if link.contains("tag=") {
        return None;
    }
    let separator = if link.contains('?') { '&' } else { '?' };
    Some(format!("{link}{separator}tag={new_tag}"))
}
