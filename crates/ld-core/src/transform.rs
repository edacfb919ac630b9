//! SVG transform lists and their application to path geometry.
//!
//! A transform attribute such as `translate(10 20) rotate(45) scale(2)` is
//! composed left to right into one `kurbo::Affine`, exactly as SVG applies
//! it. Editing happens under the inverse of that affine so that all
//! interactive geometry lives in the primitive's own local frame.

use crate::error::PathError;
use crate::path_data::{PathCmd, emit_path_data, format_num, parse_path_data};
use kurbo::{Affine, Point, Vec2};
use winnow::prelude::*;
use winnow::token::take_while;

fn separators<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(0.., |c: char| c.is_ascii_whitespace() || c == ',').parse_next(input)
}

fn function_name<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_alphabetic()).parse_next(input)
}

fn argument_list<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(0.., |c: char| c != ')').parse_next(input)
}

fn invalid(reason: impl Into<String>) -> PathError {
    PathError::InvalidTransform(reason.into())
}

fn parse_args(raw: &str) -> Result<Vec<f64>, PathError> {
    raw.split(|c: char| c.is_ascii_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| invalid(format!("bad number '{s}'")))
        })
        .collect()
}

fn build(name: &str, args: &[f64]) -> Result<Affine, PathError> {
    let affine = match (name, args) {
        ("translate", [tx]) => Affine::translate((*tx, 0.0)),
        ("translate", [tx, ty]) => Affine::translate((*tx, *ty)),
        ("scale", [s]) => Affine::scale(*s),
        ("scale", [sx, sy]) => Affine::scale_non_uniform(*sx, *sy),
        ("rotate", [deg]) => Affine::rotate(deg.to_radians()),
        ("rotate", [deg, cx, cy]) => {
            Affine::translate((*cx, *cy))
                * Affine::rotate(deg.to_radians())
                * Affine::translate((-*cx, -*cy))
        }
        ("skewX", [deg]) => Affine::new([1.0, 0.0, deg.to_radians().tan(), 1.0, 0.0, 0.0]),
        ("skewY", [deg]) => Affine::new([1.0, deg.to_radians().tan(), 0.0, 1.0, 0.0, 0.0]),
        ("matrix", [a, b, c, d, e, f]) => Affine::new([*a, *b, *c, *d, *e, *f]),
        _ => {
            return Err(invalid(format!(
                "{name} does not take {} argument(s)",
                args.len()
            )));
        }
    };
    Ok(affine)
}

/// Parse an SVG transform list. An empty string is the identity.
///
/// # Errors
/// `InvalidTransform` for unknown functions, wrong arities, or syntax errors.
pub fn parse_transform(text: &str) -> Result<Affine, PathError> {
    transform_list(text)
        .inspect_err(|e| log::warn!("parse_transform: rejected {text:?}: {e}"))
}

fn transform_list(text: &str) -> Result<Affine, PathError> {
    let mut input = text;
    let mut affine = Affine::IDENTITY;
    loop {
        let _ = separators(&mut input);
        if input.is_empty() {
            break;
        }
        let name = function_name(&mut input).map_err(|_| invalid("expected a function name"))?;
        let _ = separators(&mut input);
        input = input
            .strip_prefix('(')
            .ok_or_else(|| invalid(format!("expected '(' after {name}")))?;
        let raw = argument_list(&mut input).map_err(|_| invalid("unterminated argument list"))?;
        input = input
            .strip_prefix(')')
            .ok_or_else(|| invalid(format!("expected ')' to close {name}")))?;
        affine *= build(name, &parse_args(raw)?)?;
    }
    Ok(affine)
}

/// Emit an affine as an SVG `matrix(...)` transform.
pub fn format_transform(affine: Affine) -> String {
    let c = affine.as_coeffs();
    format!(
        "matrix({} {} {} {} {} {})",
        format_num(c[0]),
        format_num(c[1]),
        format_num(c[2]),
        format_num(c[3]),
        format_num(c[4]),
        format_num(c[5])
    )
}

/// Inverse of `affine`.
///
/// # Errors
/// `InvalidTransform` when the affine collapses the plane (zero determinant).
pub fn invert(affine: Affine) -> Result<Affine, PathError> {
    if affine.determinant().abs() < 1e-12 {
        log::debug!("invert: singular transform {:?}", affine.as_coeffs());
        return Err(invalid("transform is not invertible"));
    }
    Ok(affine.inverse())
}

/// Uniform scale factor of the linear part, `sqrt(|det|)`.
pub fn linear_scale(affine: Affine) -> f64 {
    affine.determinant().abs().sqrt()
}

/// Apply only the linear part of `affine` to a vector.
pub fn apply_vector(affine: Affine, v: Vec2) -> Vec2 {
    let c = affine.as_coeffs();
    Vec2::new(c[0] * v.x + c[2] * v.y, c[1] * v.x + c[3] * v.y)
}

/// Apply `affine` to every coordinate of the commands.
pub fn transform_cmds(cmds: &[PathCmd], affine: Affine) -> Vec<PathCmd> {
    cmds.iter()
        .map(|cmd| cmd.map_points(|p: Point| affine * p))
        .collect()
}

/// Parse, transform and re-emit a geometry string.
pub fn transform_path_data(d: &str, affine: Affine) -> Result<String, PathError> {
    let cmds = parse_path_data(d)?;
    Ok(emit_path_data(&transform_cmds(&cmds, affine)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    #[test]
    fn empty_transform_is_identity() {
        assert_eq!(parse_transform("").unwrap(), Affine::IDENTITY);
        assert_eq!(parse_transform("   ").unwrap(), Affine::IDENTITY);
    }

    #[test]
    fn composes_left_to_right() {
        let t = parse_transform("translate(10, 20) scale(2)").unwrap();
        assert!(close(t * Point::new(1.0, 1.0), Point::new(12.0, 22.0)));
    }

    #[test]
    fn rotate_about_center() {
        let t = parse_transform("rotate(90 10 10)").unwrap();
        assert!(close(t * Point::new(20.0, 10.0), Point::new(10.0, 20.0)));
    }

    #[test]
    fn inverse_roundtrips_points() {
        let t = parse_transform("translate(5 -3) rotate(30) scale(1.5 0.5)").unwrap();
        let inv = invert(t).unwrap();
        let p = Point::new(7.25, -2.0);
        assert!(close(inv * (t * p), p));
    }

    #[test]
    fn singular_transform_cannot_be_inverted() {
        let t = parse_transform("scale(0)").unwrap();
        assert!(matches!(invert(t), Err(PathError::InvalidTransform(_))));
    }

    #[test]
    fn unknown_function_is_rejected() {
        assert!(matches!(
            parse_transform("wobble(3)"),
            Err(PathError::InvalidTransform(_))
        ));
        assert!(matches!(
            parse_transform("translate(1 2 3)"),
            Err(PathError::InvalidTransform(_))
        ));
    }

    #[test]
    fn non_finite_arguments_are_rejected() {
        for text in ["scale(inf)", "translate(NaN 0)", "rotate(1e999)"] {
            assert!(
                matches!(parse_transform(text), Err(PathError::InvalidTransform(_))),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn vectors_ignore_translation() {
        let t = parse_transform("translate(100 100) scale(2)").unwrap();
        assert_eq!(apply_vector(t, Vec2::new(1.0, -1.0)), Vec2::new(2.0, -2.0));
    }

    #[test]
    fn transform_path_data_maps_every_point() {
        let d = transform_path_data("M 0 0 Q 1 1 2 0", Affine::translate((1.0, 1.0))).unwrap();
        assert_eq!(d, "M 1 1 Q 2 2 3 1");
    }
}
