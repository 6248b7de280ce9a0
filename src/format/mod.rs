//! Console output for crawl, upload, and stats results.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::crawl::CrawlReport;
use crate::model::{Cafe, StoredProduct, UploadReport};

/// Formats run results for the console.
pub struct Formatter {
    verbose: bool,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Formats the outcome of one crawl run.
    pub fn crawl_summary(&self, report: &CrawlReport, batch_path: &Path) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Site:       {}", report.site));
        lines.push(format!("Products:   {}", report.products.len()));
        let categories = if report.categories.is_empty() {
            "-".to_string()
        } else {
            report.categories.join(", ")
        };
        lines.push(format!("Categories: {}", categories));
        lines.push(format!("Pages:      {}", report.pages_visited));
        if report.failures > 0 {
            lines.push(format!("Failures:   {}", report.failures));
        }
        if report.budget_exhausted {
            lines.push("Budget:     exhausted, results are partial".to_string());
        }
        lines.push(format!("Batch:      {}", batch_path.display()));

        lines.join("\n")
    }

    /// Formats the outcome of one upload run.
    pub fn upload_summary(&self, report: &UploadReport) -> String {
        let mut lines = Vec::new();

        if report.dry_run {
            lines.push(format!("Dry run for '{}' (nothing written)", report.cafe_slug));
        } else {
            lines.push(format!("Upload for '{}'", report.cafe_slug));
        }
        lines.push(format!("  Processed:   {}", report.processed));
        lines.push(format!("  Created:     {}", report.created));
        lines.push(format!("  Updated:     {}", report.updated));
        lines.push(format!("  Unchanged:   {}", report.unchanged));
        lines.push(format!("  Removed:     {}", report.removed));
        lines.push(format!("  Reactivated: {}", report.reactivated));

        if !report.errors.is_empty() {
            lines.push(format!("  Errors:      {}", report.errors.len()));
            for error in &report.errors {
                lines.push(format!("    {}: {}", error.record, error.message));
            }
        }

        if self.verbose {
            for name in &report.removed_names {
                lines.push(format!("  - removed '{}'", name));
            }
            for name in &report.reactivated_names {
                lines.push(format!("  + reactivated '{}'", name));
            }
            if report.dry_run && !report.sample.is_empty() {
                lines.push("  Sample:".to_string());
                for product in &report.sample {
                    lines.push(format!("    {} [{}]", product.name, product.external_id));
                }
            }
        }

        lines.join("\n")
    }

    /// Formats per-café catalog statistics as a table.
    pub fn stats_table(&self, rows: &[CafeStats]) -> String {
        if rows.is_empty() {
            return "No cafés in the store.".to_string();
        }

        let slug_width = 12;
        let name_width = 16;

        let mut lines = Vec::new();
        lines.push(format!(
            "{:<slug_width$} {:<name_width$} {:>6} {:>7} {:>8}  {}",
            "Slug", "Name", "Total", "Active", "Removed", "Last updated"
        ));
        lines.push("-".repeat(slug_width + name_width + 48));

        for row in rows {
            let last_updated = row
                .last_updated
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            lines.push(format!(
                "{:<slug_width$} {:<name_width$} {:>6} {:>7} {:>8}  {}",
                row.slug, row.name, row.total, row.active, row.removed, last_updated
            ));
        }

        lines.join("\n")
    }
}

/// One café's catalog counts for the stats table.
pub struct CafeStats {
    pub slug: String,
    pub name: String,
    pub total: usize,
    pub active: usize,
    pub removed: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

impl CafeStats {
    pub fn from_products(cafe: &Cafe, products: &[StoredProduct]) -> Self {
        let active = products.iter().filter(|p| p.is_active).count();
        Self {
            slug: cafe.slug.clone(),
            name: cafe.name.clone(),
            total: products.len(),
            active,
            removed: products.len() - active,
            last_updated: products.iter().map(|p| p.updated_at).max(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExtractedProduct, RecordError};

    fn sample_product() -> ExtractedProduct {
        ExtractedProduct {
            name: "아메리카노".to_string(),
            name_en: None,
            description: None,
            price: None,
            external_image_url: String::new(),
            category: "음료".to_string(),
            external_category: "커피".to_string(),
            external_id: "m-1".to_string(),
            external_url: "https://menu.test/1".to_string(),
        }
    }

    fn sample_report() -> UploadReport {
        let mut report = UploadReport::new("mega", false);
        report.processed = 5;
        report.created = 2;
        report.updated = 1;
        report.unchanged = 2;
        report.removed = 1;
        report.removed_names = vec!["시즌 한정 라떼".to_string()];
        report
    }

    #[test]
    fn test_upload_summary_counts() {
        let output = Formatter::new(false).upload_summary(&sample_report());
        assert!(output.starts_with("Upload for 'mega'"));
        assert!(output.contains("Processed:   5"));
        assert!(output.contains("Created:     2"));
        assert!(output.contains("Removed:     1"));
        // Names only show up in verbose mode.
        assert!(!output.contains("시즌 한정 라떼"));
    }

    #[test]
    fn test_upload_summary_verbose_names() {
        let output = Formatter::new(true).upload_summary(&sample_report());
        assert!(output.contains("- removed '시즌 한정 라떼'"));
    }

    #[test]
    fn test_upload_summary_dry_run_header_and_sample() {
        let mut report = sample_report();
        report.dry_run = true;
        report.sample = vec![sample_product()];

        let quiet = Formatter::new(false).upload_summary(&report);
        assert!(quiet.starts_with("Dry run for 'mega'"));
        assert!(!quiet.contains("Sample:"));

        let verbose = Formatter::new(true).upload_summary(&report);
        assert!(verbose.contains("Sample:"));
        assert!(verbose.contains("아메리카노 [m-1]"));
    }

    #[test]
    fn test_upload_summary_lists_errors() {
        let mut report = sample_report();
        report.errors.push(RecordError {
            record: "m-9".to_string(),
            message: "record has no name".to_string(),
        });
        let output = Formatter::new(false).upload_summary(&report);
        assert!(output.contains("Errors:      1"));
        assert!(output.contains("m-9: record has no name"));
    }

    #[test]
    fn test_crawl_summary() {
        let report = CrawlReport {
            site: "paik".to_string(),
            products: vec![sample_product()],
            categories: vec!["커피".to_string(), "음료".to_string()],
            pages_visited: 3,
            failures: 0,
            budget_exhausted: false,
        };
        let output = Formatter::new(false).crawl_summary(&report, Path::new("out/paik.json"));
        assert!(output.contains("Site:       paik"));
        assert!(output.contains("Products:   1"));
        assert!(output.contains("Categories: 커피, 음료"));
        assert!(output.contains("Batch:      out/paik.json"));
        assert!(!output.contains("Failures"));
        assert!(!output.contains("Budget"));
    }

    #[test]
    fn test_crawl_summary_flags_trouble() {
        let report = CrawlReport {
            site: "mega".to_string(),
            products: Vec::new(),
            categories: Vec::new(),
            pages_visited: 0,
            failures: 2,
            budget_exhausted: true,
        };
        let output = Formatter::new(false).crawl_summary(&report, Path::new("out/mega.json"));
        assert!(output.contains("Failures:   2"));
        assert!(output.contains("results are partial"));
        assert!(output.contains("Categories: -"));
    }

    #[test]
    fn test_stats_table() {
        use chrono::TimeZone;

        let cafe = Cafe {
            id: "c1".to_string(),
            name: "메가커피".to_string(),
            slug: "mega".to_string(),
        };
        let when = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let mut active = StoredProduct::from_extracted("p1", "c1", &sample_product(), when);
        let mut gone = StoredProduct::from_extracted("p2", "c1", &sample_product(), when);
        gone.is_active = false;
        active.updated_at = Utc.with_ymd_and_hms(2025, 4, 2, 8, 0, 0).unwrap();

        let rows = vec![CafeStats::from_products(&cafe, &[active, gone])];
        let output = Formatter::new(false).stats_table(&rows);
        assert!(output.contains("mega"));
        assert!(output.contains("메가커피"));
        assert!(output.contains("2025-04-02 08:00"));

        let data_line = output.lines().last().unwrap();
        assert!(data_line.contains(" 2 "));
        assert!(data_line.contains(" 1 "));
    }

    #[test]
    fn test_stats_table_empty() {
        let output = Formatter::new(false).stats_table(&[]);
        assert_eq!(output, "No cafés in the store.");
    }
}
