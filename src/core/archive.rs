use crate::domain::model::ReportSet;
use crate::utils::error::Result;
use std::collections::HashSet;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// 路徑分隔符號換成 `_`，空字串也換成 `_`
pub fn sanitize_segment(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    if cleaned.trim().is_empty() || cleaned == "." || cleaned == ".." {
        "_".to_string()
    } else {
        cleaned
    }
}

/// 已用過的名稱加上 `_2`、`_3`… 直到不重複
fn claim(base: String, used: &mut HashSet<String>) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    (2..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| used.insert(candidate.clone()))
        .unwrap_or(base)
}

/// Packs every report into one zip as `{seller}/{seller}_{category}.pdf`. Labels that
/// sanitize to the same name get a numeric suffix.
pub fn bundle(reports: &ReportSet) -> Result<Vec<u8>> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let mut folders = HashSet::new();

    for (seller, categories) in reports {
        let folder = claim(sanitize_segment(seller), &mut folders);
        if folder != sanitize_segment(seller) {
            tracing::warn!("Seller '{}' stored as '{}/' to avoid a name clash", seller, folder);
        }
        zip.add_directory(format!("{}/", folder), options)?;

        let mut stems = HashSet::new();
        for (category, document) in categories {
            let stem = claim(format!("{}_{}", folder, sanitize_segment(category)), &mut stems);
            let name = format!("{}/{}.pdf", folder, stem);
            tracing::debug!("Adding {} ({} bytes) to archive", name, document.len());
            zip.start_file(name, options)?;
            zip.write_all(document)?;
        }
    }

    // 完成並取回底層 Vec<u8>
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}
