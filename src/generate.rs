use std::time::Duration;

use anyhow::Context as _;
use rand::Rng;
use rand::seq::IndexedRandom as _;

use crate::catalog::{Book, Catalog, CatalogError, CatalogStore, FileStore, Niche};
use crate::cli::GenerateArgs;
use crate::http::FetchError;
use crate::openai::OpenAiGenerator;

const PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/300x450?text=Book+Cover";

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("no generator configured")]
    Unavailable,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("unexpected generator output: {0}")]
    Shape(String),
}

/// Produces a fresh book list for a niche.
pub trait BookGenerator {
    fn name(&self) -> &str;
    fn generate(&self, niche: &Niche) -> Result<Vec<Book>, GenerateError>;
}

/// Stand-in used when no API credential is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullGenerator;

impl BookGenerator for NullGenerator {
    fn name(&self) -> &str {
        "none"
    }

    fn generate(&self, _niche: &Niche) -> Result<Vec<Book>, GenerateError> {
        Err(GenerateError::Unavailable)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSource {
    Generated,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub slug: String,
    pub source: BookSource,
    pub books: Vec<Book>,
    pub saved: bool,
}

pub struct GenerateOptions<'a> {
    pub slug: Option<&'a str>,
    pub dry_run: bool,
    pub affiliate_tag: &'a str,
}

pub fn run(catalog_path: &str, args: GenerateArgs) -> anyhow::Result<()> {
    let store = FileStore::new(catalog_path);

    let openai = OpenAiGenerator::from_env(
        &args.openai_base_url,
        &args.openai_model,
        &args.affiliate_tag,
        Duration::from_secs(args.timeout_secs),
    )
    .context("build openai client")?;
    let generator: Box<dyn BookGenerator> = match openai {
        Some(openai) => Box::new(openai),
        None => {
            tracing::warn!("OPENAI_API_KEY is not set; running in simulation mode");
            Box::new(NullGenerator)
        }
    };

    let options = GenerateOptions {
        slug: args.slug.as_deref(),
        dry_run: args.dry_run,
        affiliate_tag: &args.affiliate_tag,
    };
    let report = generate_store(&store, generator.as_ref(), &mut rand::rng(), &options)?;
    let Some(report) = report else {
        println!("No niches found to process.");
        return Ok(());
    };

    if report.saved {
        println!(
            "Regenerated {} books for niche '{}'.",
            report.books.len(),
            report.slug
        );
    } else {
        let json = serde_json::to_string_pretty(&report.books).context("serialize books")?;
        println!(
            "Dry run: content would have been saved for niche '{}'.\n{json}",
            report.slug
        );
    }
    Ok(())
}

/// Replaces one niche's books and saves unless `dry_run` is set.
///
/// Returns `None` when the catalog has no niches.
pub fn generate_store(
    store: &dyn CatalogStore,
    generator: &dyn BookGenerator,
    rng: &mut impl Rng,
    options: &GenerateOptions<'_>,
) -> anyhow::Result<Option<GenerationReport>> {
    let mut catalog = store.load().context("load catalog")?;
    let index = match select_niche(&catalog, options.slug, rng) {
        Ok(index) => index,
        Err(CatalogError::Empty) => {
            tracing::warn!("no niches found to process");
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };
    let niche = &mut catalog.niches[index];
    tracing::info!(niche = %niche.title, slug = %niche.slug, "generating content");

    let (books, source) = books_for(niche, generator, rng, options.affiliate_tag);
    niche.books = books.clone();
    let slug = niche.slug.clone();

    let saved = if options.dry_run {
        tracing::info!(slug = %slug, "dry run; catalog not written");
        false
    } else {
        catalog.touch();
        store
            .save(&catalog)
            .with_context(|| format!("save catalog: {}", store.location()))?;
        true
    };

    Ok(Some(GenerationReport {
        slug,
        source,
        books,
        saved,
    }))
}

/// An empty catalog is `CatalogError::Empty` even when a slug is given.
pub fn select_niche(
    catalog: &Catalog,
    slug: Option<&str>,
    rng: &mut impl Rng,
) -> Result<usize, CatalogError> {
    if catalog.niches.is_empty() {
        return Err(CatalogError::Empty);
    }
    match slug {
        Some(slug) => catalog.position(slug),
        None => Ok(rng.random_range(0..catalog.niches.len())),
    }
}

fn books_for(
    niche: &Niche,
    generator: &dyn BookGenerator,
    rng: &mut impl Rng,
    affiliate_tag: &str,
) -> (Vec<Book>, BookSource) {
    match generator.generate(niche) {
        Ok(books) => return (books, BookSource::Generated),
        Err(GenerateError::Unavailable) => {}
        Err(err) => {
            tracing::warn!(
                generator = generator.name(),
                error = %err,
                "generation failed; falling back to built-in books"
            );
        }
    }
    tracing::info!("using built-in example books");
    (fallback_books(rng, affiliate_tag), BookSource::Fallback)
}

pub fn build_prompt(niche: &Niche, affiliate_tag: &str) -> String {
    format!(
        "Recommend 3 distinct books for the niche: \"{title}\".\n\
The audience is: {audience}.\n\
\n\
IMPORTANT: The reader wants offbeat choices.\n\
Select 1 fundamental classic and 2 hidden gems: underrated books that are surprisingly excellent but less famous.\n\
Avoid the most obvious top-of-the-charts bestsellers.\n\
\n\
Return a JSON object with a key \"books\" containing a list of books in this format:\n\
{{\n\
  \"books\": [\n\
    {{\n\
      \"title\": \"Book Title\",\n\
      \"author\": \"Author Name\",\n\
      \"description\": \"A 2-sentence persuasive reason why this specific audience should read it.\",\n\
      \"image_url\": \"{PLACEHOLDER_IMAGE_URL}\",\n\
      \"amazon_link\": \"https://amazon.com/s?k=BOOK+TITLE+AUTHOR&tag={affiliate_tag}\"\n\
    }}\n\
  ]\n\
}}\n",
        title = niche.title,
        audience = niche.description,
    )
}

/// Accepts either a bare list or an object with a `books` list.
pub fn parse_books(content: &str) -> Result<Vec<Book>, GenerateError> {
    let value: serde_json::Value = serde_json::from_str(content)
        .map_err(|err| GenerateError::Shape(format!("response is not JSON: {err}")))?;

    let list = match value {
        serde_json::Value::Array(list) => serde_json::Value::Array(list),
        serde_json::Value::Object(mut obj) => obj
            .remove("books")
            .ok_or_else(|| GenerateError::Shape("missing `books` key".to_owned()))?,
        other => {
            return Err(GenerateError::Shape(format!(
                "expected object or list, got {other}"
            )));
        }
    };

    let books: Vec<Book> = serde_json::from_value(list)
        .map_err(|err| GenerateError::Shape(format!("invalid book list: {err}")))?;
    if books.is_empty() {
        return Err(GenerateError::Shape("book list is empty".to_owned()));
    }
    Ok(books)
}

struct ExampleBook {
    title: &'static str,
    author: &'static str,
    description: &'static str,
    image_url: &'static str,
    asin: &'static str,
}

const EXAMPLE_BOOKS: [ExampleBook; 3] = [
    ExampleBook {
        title: "The Innovators",
        author: "Walter Isaacson",
        description: "A riveting history of the digital revolution.",
        image_url: "https://m.media-amazon.com/images/I/81p2zWd0+YL._AC_UF1000,1000_QL80_.jpg",
        asin: "147670869X",
    },
    ExampleBook {
        title: "Superintelligence",
        author: "Nick Bostrom",
        description: "Paths, Dangers, Strategies. Essential for thinking about AI safety.",
        image_url: "https://m.media-amazon.com/images/I/7106J1U1CaL._AC_UF1000,1000_QL80_.jpg",
        asin: "0199678111",
    },
    ExampleBook {
        title: "Clean Code",
        author: "Robert C. Martin",
        description: "A handbook of agile software craftsmanship. A classic for a reason.",
        image_url: "https://m.media-amazon.com/images/I/51E2055ZGUL._AC_UF1000,1000_QL80_.jpg",
        asin: "0132350882",
    },
];

/// 1 to 3 distinct books from the built-in pool.
pub fn fallback_books(rng: &mut impl Rng, affiliate_tag: &str) -> Vec<Book> {
    let count = rng.random_range(1..=EXAMPLE_BOOKS.len());
    EXAMPLE_BOOKS
        .choose_multiple(rng, count)
        .map(|example| Book {
            title: example.title.to_owned(),
            author: example.author.to_owned(),
            description: example.description.to_owned(),
            image_url: example.image_url.to_owned(),
            amazon_link: format!("https://amazon.com/dp/{}?tag={affiliate_tag}", example.asin),
            extra: serde_json::Map::new(),
        })
        .collect()
}
