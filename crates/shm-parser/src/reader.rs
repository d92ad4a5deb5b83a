//! Whole-file readers.

use bytes::Bytes;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{ShmError, ShmResult};
use crate::model::{CoefficientRecord, ModelFormat, ModelHeader, ShmModel};
use crate::parse::{gfc_line, header_entry, is_blank_or_comment, shm_header_line, shm_line};

/// Options controlling how a model file is read.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Drop records above this degree.
    pub max_degree: Option<usize>,
    /// Insert C00 = 1 when the file omits degree 0 (EGM2008 files start at degree 2).
    pub imply_monopole: bool,
    /// Force a format instead of detecting it.
    pub format: Option<ModelFormat>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            max_degree: None,
            imply_monopole: true,
            format: None,
        }
    }
}

impl ReadOptions {
    /// Options truncating the model at `lmax`.
    pub fn truncated(lmax: usize) -> Self {
        Self {
            max_degree: Some(lmax),
            ..Self::default()
        }
    }
}

/// Read a model file from disk.
pub fn read_model_file(path: impl AsRef<Path>, options: &ReadOptions) -> ShmResult<ShmModel> {
    let path = path.as_ref();
    info!(path = %path.display(), max_degree = ?options.max_degree, "Reading coefficient file");
    let data = Bytes::from(std::fs::read(path)?);
    let model = read_model(data, options)
        .map_err(|e| match e {
            ShmError::Empty(_) => ShmError::Empty(path.display().to_string()),
            other => other,
        })?;
    info!(
        path = %path.display(),
        lmax = model.lmax,
        records = model.records.len(),
        has_errors = model.has_errors(),
        "Loaded coefficient file"
    );
    Ok(model)
}

/// Parse a model held in memory.
pub fn read_model(data: Bytes, options: &ReadOptions) -> ShmResult<ShmModel> {
    let text = std::str::from_utf8(&data).map_err(|e| ShmError::InvalidEncoding(e.to_string()))?;
    let format = options.format.unwrap_or_else(|| ModelFormat::detect(text));
    debug!(?format, bytes = data.len(), "Parsing coefficient data");

    let (header, mut records) = match format {
        ModelFormat::Shm => parse_shm(text, options)?,
        ModelFormat::Icgem => parse_icgem(text, options)?,
    };

    if options.imply_monopole && !records.iter().any(|r| r.degree == 0 && r.order == 0) {
        debug!("Degree 0 absent, inserting C00 = 1");
        // C00 = 1 is exact: zero sigmas when the file carries errors
        let sigma = (!records.is_empty()
            && records.iter().all(|r| r.sigma_c.is_some() && r.sigma_s.is_some()))
        .then_some(0.0);
        records.push(CoefficientRecord {
            degree: 0,
            order: 0,
            c: 1.0,
            s: 0.0,
            sigma_c: sigma,
            sigma_s: sigma,
        });
    }

    if records.is_empty() {
        return Err(ShmError::Empty("input".to_string()));
    }

    records.sort_by_key(|r| (r.degree, r.order));
    let lmax = records.iter().map(|r| r.degree).max().unwrap_or(0);

    if let Some(declared) = header.max_degree {
        if declared < lmax {
            return Err(ShmError::InvalidHeader(format!(
                "header declares max degree {} but data reaches {}",
                declared, lmax
            )));
        }
    }

    Ok(ShmModel {
        format,
        header,
        records,
        lmax,
    })
}

fn accept_record(
    record: CoefficientRecord,
    line: usize,
    options: &ReadOptions,
    seen: &mut HashSet<(usize, usize)>,
    records: &mut Vec<CoefficientRecord>,
) -> ShmResult<()> {
    if record.order > record.degree {
        return Err(ShmError::InvalidIndex {
            line,
            degree: record.degree,
            order: record.order,
        });
    }
    if let Some(max) = options.max_degree {
        if record.degree > max {
            return Ok(());
        }
    }
    if !seen.insert((record.degree, record.order)) {
        return Err(ShmError::Duplicate {
            line,
            degree: record.degree,
            order: record.order,
        });
    }
    records.push(record);
    Ok(())
}

fn parse_shm(text: &str, options: &ReadOptions) -> ShmResult<(ModelHeader, Vec<CoefficientRecord>)> {
    let mut header = ModelHeader::default();
    let mut records = Vec::new();
    let mut seen = HashSet::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if is_blank_or_comment(line) {
            continue;
        }
        match shm_line(line) {
            Ok((_, record)) => accept_record(record, line_no, options, &mut seen, &mut records)?,
            Err(_) if records.is_empty() && header.radius.is_none() => {
                let (_, (r0, gm, lmax)) = shm_header_line(line)
                    .map_err(|_| ShmError::parse(line_no, format!("unrecognized line: {}", line.trim())))?;
                header.radius = Some(r0);
                header.gm = Some(gm);
                header.max_degree = lmax.map(|v| v as usize);
                debug!(r0, gm, ?lmax, "Found .shm header line");
            }
            Err(_) => {
                return Err(ShmError::parse(
                    line_no,
                    format!("expected 'l m C S [sigmaC sigmaS]', got: {}", line.trim()),
                ))
            }
        }
    }
    Ok((header, records))
}

fn parse_icgem(text: &str, options: &ReadOptions) -> ShmResult<(ModelHeader, Vec<CoefficientRecord>)> {
    let mut header = ModelHeader::default();
    let mut records = Vec::new();
    let mut seen = HashSet::new();
    let mut in_header = true;
    let mut skipped = 0usize;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if is_blank_or_comment(line) {
            continue;
        }
        if in_header {
            let Some((key, value)) = header_entry(line) else {
                continue;
            };
            match key {
                "end_of_head" => in_header = false,
                "modelname" => header.name = Some(value.to_string()),
                "earth_gravity_constant" => header.gm = Some(parse_header_real(key, value, line_no)?),
                "radius" => header.radius = Some(parse_header_real(key, value, line_no)?),
                "max_degree" => {
                    let v = value
                        .parse::<usize>()
                        .map_err(|e| ShmError::parse(line_no, format!("max_degree: {}", e)))?;
                    header.max_degree = Some(v);
                }
                "norm" => header.normalization = Some(value.to_string()),
                "tide_system" => header.tide_system = Some(value.to_string()),
                _ => {}
            }
            continue;
        }
        if line.trim_start().starts_with("gfc ") || line.trim_start().starts_with("gfc\t") {
            let (_, record) = gfc_line(line)
                .map_err(|_| ShmError::parse(line_no, format!("malformed gfc line: {}", line.trim())))?;
            accept_record(record, line_no, options, &mut seen, &mut records)?;
        } else {
            skipped += 1;
        }
    }

    if in_header {
        return Err(ShmError::InvalidHeader("missing end_of_head".to_string()));
    }
    if let Some(norm) = &header.normalization {
        if norm != "fully_normalized" {
            return Err(ShmError::InvalidHeader(format!(
                "unsupported normalization '{}'",
                norm
            )));
        }
    }
    if skipped > 0 {
        warn!(skipped, "Skipped non-gfc data lines (time-variable terms are not supported)");
    }
    Ok((header, records))
}

fn parse_header_real(key: &str, value: &str, line: usize) -> ShmResult<f64> {
    value
        .replace(|c: char| c == 'd' || c == 'D', "e")
        .parse::<f64>()
        .map_err(|e| ShmError::parse(line, format!("{}: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_SHM: &str = "\
    2    0   -0.484165143790815D-03    0.000000000000000D+00    0.7481239490D-11    0.0000000000D+00
    2    1   -0.206615509074176D-09    0.138441389137979D-08    0.7061397443D-11    0.7004263936D-11
    2    2    0.243938357328313D-05   -0.140027370385934D-05    0.7436209380D-11    0.7451286774D-11
";

    #[test]
    fn test_read_small_shm() {
        let model = read_model(Bytes::from_static(SMALL_SHM.as_bytes()), &ReadOptions::default()).unwrap();
        assert_eq!(model.format, ModelFormat::Shm);
        assert_eq!(model.lmax, 2);
        // 3 data lines + implied monopole
        assert_eq!(model.records.len(), 4);
        assert_eq!(model.get(0, 0).map(|r| r.c), Some(1.0));
        assert!((model.get(2, 0).unwrap().c + 0.484165143790815e-3).abs() < 1e-18);
    }

    #[test]
    fn test_implied_monopole_keeps_file_errors() {
        let model = read_model(Bytes::from_static(SMALL_SHM.as_bytes()), &ReadOptions::default()).unwrap();
        let c00 = model.get(0, 0).unwrap();
        assert_eq!((c00.sigma_c, c00.sigma_s), (Some(0.0), Some(0.0)));
        assert!(model.has_errors());

        let bare = "    2    0   -0.484165143790815D-03    0.000000000000000D+00\n";
        let model = read_model(Bytes::from_static(bare.as_bytes()), &ReadOptions::default()).unwrap();
        assert_eq!(model.get(0, 0).unwrap().sigma_c, None);
        assert!(!model.has_errors());
    }

    #[test]
    fn test_truncation() {
        let model = read_model(Bytes::from_static(SMALL_SHM.as_bytes()), &ReadOptions::truncated(1)).unwrap();
        assert_eq!(model.lmax, 0);
        assert_eq!(model.records.len(), 1);
    }

    #[test]
    fn test_order_above_degree_rejected() {
        let err = read_model(Bytes::from_static(b"2 3 1.0 0.0\n"), &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, ShmError::InvalidIndex { line: 1, degree: 2, order: 3 }));
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = read_model(
            Bytes::from_static(b"2 0 1.0 0.0\n2 0 1.0 0.0\n"),
            &ReadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ShmError::Duplicate { line: 2, .. }));
    }

    #[test]
    fn test_empty_rejected() {
        let options = ReadOptions {
            imply_monopole: false,
            ..ReadOptions::default()
        };
        let err = read_model(Bytes::from_static(b"# nothing here\n\n"), &options).unwrap_err();
        assert!(matches!(err, ShmError::Empty(_)));
    }

    #[test]
    fn test_header_line() {
        let text = "6378136.3 3.986004415e14 2\n2 0 -4.8e-4 0.0\n";
        let model = read_model(Bytes::from(text), &ReadOptions::default()).unwrap();
        assert_eq!(model.header.radius, Some(6378136.3));
        assert_eq!(model.header.gm, Some(3.986004415e14));
        assert_eq!(model.header.max_degree, Some(2));
    }

    #[test]
    fn test_garbage_line_reports_line_number() {
        let text = "2 0 -4.8e-4 0.0\nnot a number\n";
        let err = read_model(Bytes::from(text), &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, ShmError::Parse { line: 2, .. }));
    }
}
