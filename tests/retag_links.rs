use std::fs;

use predicates::prelude::*;
use serde_json::Value;

#[test]
fn retag_rewrites_every_link_and_preserves_extra_fields() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let catalog_path = temp.path().join("content.json");
    fs::write(
        &catalog_path,
        r#"{
  "niches": [
    {
      "slug": "founders",
      "title": "Founders",
      "description": "Startup founders",
      "featured": true,
      "books": [
        { "title": "A", "author": "X", "description": "", "image_url": "", "amazon_link": "https://x.com/dp/ABC?tag=bibliophileai-20" },
        { "title": "B", "author": "Y", "description": "", "image_url": "", "amazon_link": "https://x.com/dp/DEF" },
        { "title": "C", "author": "Z", "description": "", "image_url": "", "amazon_link": "https://x.com/dp/GHI?ref=xyz" },
        { "title": "D", "author": "W", "description": "", "image_url": "", "amazon_link": "https://x.com/dp/JKL?tag=partner-21" }
      ]
    }
  ],
  "last_updated": "2025-01-01T00:00:00"
}
"#,
    )?;

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("nichecat");
    cmd.current_dir(temp.path())
        .args(["--catalog", catalog_path.to_str().unwrap(), "retag"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Updated 3 of 4 links to use tag: busybibliophi-20",
        ));

    let saved: Value = serde_json::from_str(&fs::read_to_string(&catalog_path)?)?;
    let niche = &saved["niches"][0];
    assert_eq!(niche["featured"], true);
    let links: Vec<&str> = niche["books"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["amazon_link"].as_str().unwrap())
        .collect();
    assert_eq!(
        links,
        [
            "https://x.com/dp/ABC?tag=busybibliophi-20",
            "https://x.com/dp/DEF?tag=busybibliophi-20",
            "https://x.com/dp/GHI?ref=xyz&tag=busybibliophi-20",
            "https://x.com/dp/JKL?tag=partner-21",
        ]
    );

    let mut again = assert_cmd::cargo::cargo_bin_cmd!("nichecat");
    again
        .current_dir(temp.path())
        .args(["--catalog", catalog_path.to_str().unwrap(), "retag"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated 0 of 4 links"));
    Ok(())
}

#[test]
fn retag_rejects_malformed_catalog() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let catalog_path = temp.path().join("content.json");
    fs::write(&catalog_path, "{ \"niches\": [")?;

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("nichecat");
    cmd.current_dir(temp.path())
        .args(["--catalog", catalog_path.to_str().unwrap(), "retag"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("catalog is not valid JSON"));

    assert_eq!(fs::read_to_string(&catalog_path)?, "{ \"niches\": [");
    Ok(())
}

#[test]
fn rust_log_debug_emits_parsed_cli() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let catalog_path = temp.path().join("content.json");
    fs::write(&catalog_path, r#"{"niches":[]}"#)?;

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("nichecat");
    cmd.current_dir(temp.path())
        .env("RUST_LOG", "debug")
        .args(["--catalog", catalog_path.to_str().unwrap(), "retag"])
        .assert()
        .success()
        .stderr(predicate::str::contains("parsed cli"));
    Ok(())
}
