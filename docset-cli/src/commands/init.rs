//! Init command implementation.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = include_str!("../../../docset.yml.example");

/// Initialize a new docset project
pub fn init_project(path: Option<&Path>) -> Result<()> {
    let root = path.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(root).with_context(|| format!("Failed to create {:?}", root))?;

    write_config(root)?;
    scaffold_content(root)?;

    println!("✓ docset initialized in {:?}", root);
    println!("  - Edit docset.yml to customize site metadata");
    println!("  - Write pages in content/svelte/ or content/kit/");
    Ok(())
}

fn write_config(root: &Path) -> Result<()> {
    let config_path = root.join("docset.yml");
    if config_path.exists() {
        println!("docset.yml already exists at {:?}", config_path);
        return Ok(());
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {:?}", config_path))?;
    println!("Created {:?}", config_path);
    Ok(())
}

fn scaffold_content(root: &Path) -> Result<()> {
    let content = root.join("content");
    for (variant, title, next) in [
        ("svelte", "Svelte", "svelte/components"),
        ("kit", "SvelteKit", "kit/routing"),
    ] {
        let dir = content.join(variant);
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {:?}", dir))?;

        let sample = dir.join("introduction.md");
        if !sample.exists() {
            fs::write(&sample, sample_page(title, next))
                .with_context(|| format!("Failed to write {:?}", sample))?;
            println!("Created {:?}", sample);
        }
    }
    Ok(())
}

fn sample_page(variant: &str, next: &str) -> String {
    format!(
        r#"---
title: Introduction
description: Getting started with {variant}
category: Getting started
order: 1
nextPath:
  Next: {next}
linksOnThisPage:
  Installation: installation
---

Welcome to the {variant} documentation.

## Installation

```shellscript title="terminal"
<!-- prettier-ignore -->
npm install
```
"#
    )
}
