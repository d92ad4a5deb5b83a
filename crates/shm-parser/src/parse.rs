//! Line-level parsers built on nom.
//!
//! Numbers may use Fortran `D` exponents (`-0.484165143790815D-03`), which
//! EGM2008 distribution files do.

use nom::{
    bytes::complete::{tag, take_while1},
    character::complete::{digit1, space0, space1},
    combinator::{all_consuming, map_res, opt},
    sequence::{preceded, terminated, tuple},
    IResult,
};

use crate::model::CoefficientRecord;

/// Unsigned integer (degree, order).
pub fn unsigned(input: &str) -> IResult<&str, usize> {
    map_res(digit1, |s: &str| s.parse::<usize>())(input)
}

/// Real number with optional `E`/`D` exponent.
pub fn real(input: &str) -> IResult<&str, f64> {
    map_res(
        take_while1(|c: char| {
            c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E' | 'd' | 'D')
        }),
        |s: &str| s.replace(|c: char| c == 'd' || c == 'D', "e").parse::<f64>(),
    )(input)
}

/// `l m C S [sigmaC sigmaS]` without any leading keyword.
fn coefficient_fields(input: &str) -> IResult<&str, CoefficientRecord> {
    let (input, (degree, _, order, _, c, _, s)) =
        tuple((unsigned, space1, unsigned, space1, real, space1, real))(input)?;
    let (input, sigmas) = opt(tuple((space1, real, space1, real)))(input)?;
    let (sigma_c, sigma_s) = match sigmas {
        Some((_, sc, _, ss)) => (Some(sc), Some(ss)),
        None => (None, None),
    };
    Ok((
        input,
        CoefficientRecord {
            degree,
            order,
            c,
            s,
            sigma_c,
            sigma_s,
        },
    ))
}

/// A whole `.shm` data line.
pub fn shm_line(input: &str) -> IResult<&str, CoefficientRecord> {
    all_consuming(terminated(preceded(space0, coefficient_fields), space0))(input)
}

/// A whole ICGEM `gfc` data line.
pub fn gfc_line(input: &str) -> IResult<&str, CoefficientRecord> {
    all_consuming(terminated(
        preceded(tuple((space0, tag("gfc"), space1)), coefficient_fields),
        space0,
    ))(input)
}

/// A header line of whitespace-separated reals: `r0 gm [lmax]`.
pub fn shm_header_line(input: &str) -> IResult<&str, (f64, f64, Option<f64>)> {
    all_consuming(terminated(
        tuple((
            preceded(space0, real),
            preceded(space1, real),
            opt(preceded(space1, real)),
        )),
        space0,
    ))(input)
}

/// An ICGEM `key value` header line.
pub fn header_entry(input: &str) -> Option<(&str, &str)> {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let key = parts.next()?;
    let value = parts.next().map(str::trim).unwrap_or("");
    if key.is_empty() {
        None
    } else {
        Some((key, value))
    }
}

/// True for lines that carry no data.
pub fn is_blank_or_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('%')
}
