//! Shared test constants and helpers for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// The end-to-end article example: one open-access article with a DOI.
pub const ARTICLE_BIB: &str = r#"@article{ab:2020,
  title = {a study of {X-Ray} diffusion},
  author = {Doe, Jane},
  date = {2020},
  journaltitle = {Physics Letters},
  doi = {10.1/xyz},
  open = {true},
}
"#;

/// One entry of each category plus a structured-name author.
pub const MIXED_BIB: &str = r#"@string{pmlr = "PMLR"}

@article{smith:2019,
  title = {{{Deep}} learning for the {NASA} archive},
  author = {Smith, John and family=Beethoven, given=Ludwig, prefix=van, useprefix=true},
  date = {2019-03-04},
  journaltitle = {journal of space science},
  url = {https://example.org/smith},
}

@inproceedings{conf/icml/2021,
  title = {fast and slow},
  author = {Lee, Kim},
  date = {2021},
  eventtitle = {ICML},
  publisher = pmlr,
  repo = {https://github.com/lee/fast},
}

@online{later,
  title = {coming soon},
  author = {Ng, Andrew},
  howpublished = {arXiv},
  preprint = {https://arxiv.org/pdf/2101.00001},
  abstract = {An abstract with *markdown*.},
}

@thesis{phd-2018,
  title = {on things},
  author = {Ng, Andrew},
  date = {2018},
}
"#;

/// Creates a site directory with the bibliography at its default location.
pub fn site_with_bib(bib: &str) -> TempDir {
    let site = TempDir::new().unwrap();
    write_bib(site.path(), bib);
    site
}

/// Writes (or replaces) `_bibliography/my-papers.bib` under `root`.
pub fn write_bib(root: &Path, bib: &str) -> PathBuf {
    let path = root.join("_bibliography/my-papers.bib");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, bib).unwrap();
    path
}

/// Reads a generated document relative to the site root.
pub fn read_doc(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative))
        .unwrap_or_else(|e| panic!("cannot read {}: {}", relative, e))
}

/// All `.qmd` files under `publications/`, relative to the root, sorted.
pub fn generated_files(root: &Path) -> Vec<String> {
    let mut files = Vec::new();
    let publications = root.join("publications");
    let Ok(dirs) = fs::read_dir(&publications) else {
        return files;
    };
    for dir in dirs {
        let dir = dir.unwrap().path();
        if !dir.is_dir() {
            continue;
        }
        for file in fs::read_dir(&dir).unwrap() {
            let file = file.unwrap().path();
            if file.extension().is_some_and(|e| e == "qmd") {
                let relative = file.strip_prefix(root).unwrap();
                files.push(relative.to_string_lossy().replace('\\', "/"));
            }
        }
    }
    files.sort();
    files
}
