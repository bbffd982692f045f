use anyhow::{Context, Result};
use movie_core::{CatalogRow, DisplayFields};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One row of the prepared feature table.
#[derive(Debug, Deserialize)]
pub struct InputMovie {
    #[serde(alias = "movieId")]
    pub id: u64,
    pub title: String,
    /// Pre-combined feature text. Built from the lists below when absent.
    #[serde(default, alias = "combined_text")]
    pub combined: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(default)]
    pub crew: Vec<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub overview: Option<String>,
}

impl InputMovie {
    /// `None` when the movie has no title or no descriptive text at all.
    pub fn into_row(self) -> Option<CatalogRow> {
        if self.title.trim().is_empty() {
            return None;
        }
        let combined = self
            .combined
            .filter(|c| !c.trim().is_empty())
            .or_else(|| combine_features(&[&self.genres, &self.keywords, &self.cast, &self.crew]))?;
        Some(CatalogRow {
            id: self.id,
            title: self.title,
            combined_text: combined,
            display: DisplayFields {
                genres: self.genres,
                rating: self.rating,
                overview: self.overview,
                cast: self.cast,
                crew: self.crew,
                keywords: self.keywords,
            },
        })
    }
}

/// Collapse every entry to one lowercase token ("Tom Hanks" -> "tomhanks")
/// and join all groups in order.
pub fn combine_features(groups: &[&[String]]) -> Option<String> {
    let tokens: Vec<String> = groups
        .iter()
        .flat_map(|g| g.iter())
        .map(|entry| entry.split_whitespace().collect::<String>().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() { None } else { Some(tokens.join(" ")) }
}

/// JSON and JSONL files under `input` (or `input` itself), in file name order.
pub fn collect_files(input: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files
}

pub fn read_file(file: &Path) -> Result<Vec<InputMovie>> {
    if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
        read_jsonl(file)
    } else {
        read_json(file)
    }
}

fn read_jsonl(file: &Path) -> Result<Vec<InputMovie>> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    let mut movies = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let movie: InputMovie = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", file.display(), lineno + 1))?;
        movies.push(movie);
    }
    Ok(movies)
}

fn read_json(file: &Path) -> Result<Vec<InputMovie>> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    let json: serde_json::Value = serde_json::from_reader(reader)
        .with_context(|| format!("parsing {}", file.display()))?;
    let movies = match json {
        serde_json::Value::Array(arr) => arr
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<InputMovie>, _>>()?,
        serde_json::Value::Object(_) => vec![serde_json::from_value(json)?],
        _ => Vec::new(),
    };
    Ok(movies)
}

/// Read every input file and keep the rows usable for indexing.
pub fn load_rows(input: &Path) -> Result<Vec<CatalogRow>> {
    let files = collect_files(input);
    if files.is_empty() {
        anyhow::bail!("no .json or .jsonl input found at {}", input.display());
    }
    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for file in files {
        for movie in read_file(&file)? {
            let id = movie.id;
            match movie.into_row() {
                Some(row) => rows.push(row),
                None => {
                    skipped += 1;
                    tracing::warn!(id, file = %file.display(), "skipping movie without title or descriptive text");
                }
            }
        }
    }
    tracing::info!(rows = rows.len(), skipped, "read feature table");
    Ok(rows)
}
