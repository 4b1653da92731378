//! Space-group symmetry operations compiled from their parametric `x,y,z` forms.

use std::fmt;

use anyhow::{self, ensure, format_err};
use lazy_static::lazy_static;
use nalgebra::{Matrix3, Vector3};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::auxiliary::geometry::{
    periodic_eq, snap_fractional_matrix, snap_fractional_vector, wrap_into_cell,
};
use crate::auxiliary::misc::SnappableFloat;
use crate::symmetry::SymmetryError;

#[cfg(test)]
#[path = "symmetry_operation_tests.rs"]
mod symmetry_operation_tests;

lazy_static! {
    static ref TOKEN_RE: Regex =
        Regex::new(r"^\s*(?:(?P<num>\d+(?:\.\d*)?|\.\d+)|(?P<var>[xyzXYZ])|(?P<op>[-+*/()]))")
            .expect("Regex pattern invalid.");
}

// ==================
// Struct definitions
// ==================

/// A structure for managing an affine symmetry operation $`\mathbf{x} \mapsto \mathbf{W}\mathbf{x}
/// + \mathbf{w}`$ acting on column vectors.
///
/// Both parts act on fractional coordinates, whether the operation was compiled from a parametric
/// string or belongs to a built [`crate::cell::CrystalCell`]. Cartesian rotations are obtained
/// through [`crate::lattice::Lattice::cartesian_rotation`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SymmetryOperation {
    /// The rotational part $`\mathbf{W}`$.
    pub rotation: Matrix3<f64>,

    /// The translational part $`\mathbf{w}`$.
    pub translation: Vector3<f64>,

    /// The parametric form this operation was compiled from, or regenerated from its fractional
    /// representation.
    pub xyz: String,

    /// A threshold for approximate equality comparisons.
    pub threshold: f64,
}

impl SymmetryOperation {
    /// Compiles a parametric `x,y,z`-style string such as `-x+1/2,y,-z` into an affine operation.
    ///
    /// Each of the three comma-separated components must be a linear expression in `x`, `y` and
    /// `z` built only from numeric literals, the operators `+`, `-`, `*`, `/` and parentheses.
    ///
    /// # Arguments
    ///
    /// * `xyz` - The parametric string.
    /// * `threshold` - A threshold for approximate equality comparisons.
    ///
    /// # Errors
    ///
    /// Errors with a [`SymmetryError`] if the string is not a valid linear expression triple.
    pub fn from_xyz(xyz: &str, threshold: f64) -> Result<Self, anyhow::Error> {
        let components = xyz.trim().trim_matches('\'').split(',').collect::<Vec<_>>();
        if components.len() != 3 {
            return Err(format_err!(SymmetryError(format!(
                "`{xyz}` does not have exactly three components."
            ))));
        }
        let mut rotation = Matrix3::zeros();
        let mut translation = Vector3::zeros();
        for (i, component) in components.iter().enumerate() {
            let affine = parse_component(component).map_err(|err| {
                format_err!(SymmetryError(format!(
                    "Unable to parse component `{component}` of `{xyz}`: {err}"
                )))
            })?;
            rotation.set_row(i, &affine.coefficients.transpose());
            translation[i] = affine.constant;
        }
        Ok(Self {
            rotation,
            translation,
            xyz: xyz.trim().to_string(),
            threshold,
        })
    }

    /// Constructs an operation from its rotational and translational parts, generating its
    /// parametric form.
    #[must_use]
    pub fn from_parts(rotation: Matrix3<f64>, translation: Vector3<f64>, threshold: f64) -> Self {
        let xyz = format_xyz(&rotation, &translation, threshold);
        Self {
            rotation,
            translation,
            xyz,
            threshold,
        }
    }

    /// Returns the identity operation `x,y,z`.
    #[must_use]
    pub fn identity(threshold: f64) -> Self {
        Self::from_parts(Matrix3::identity(), Vector3::zeros(), threshold)
    }

    /// Applies this operation to a position.
    #[must_use]
    pub fn apply(&self, position: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * position + self.translation
    }

    /// Returns the composition $`\hat{O}_{\mathrm{self}} \hat{O}_{\mathrm{other}}`$, with the
    /// translation brought into the unit cell.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        let rotation = self.rotation * other.rotation;
        let translation = wrap_into_cell(
            &(self.rotation * other.translation + self.translation),
            self.threshold,
        );
        Self::from_parts(rotation, translation, self.threshold)
    }

    /// Returns a copy of this operation with its translation replaced. The parametric form is
    /// regenerated.
    #[must_use]
    pub fn with_translation(&self, translation: Vector3<f64>) -> Self {
        Self::from_parts(self.rotation, translation, self.threshold)
    }

    /// Returns a copy of this operation with all entries snapped onto small-denominator
    /// rationals and the translation brought into the unit cell. The parametric form is
    /// regenerated.
    #[must_use]
    pub fn snapped(&self) -> Self {
        let rotation = snap_fractional_matrix(&self.rotation, self.threshold);
        let translation = wrap_into_cell(
            &snap_fractional_vector(&self.translation, self.threshold),
            self.threshold,
        );
        Self::from_parts(rotation, translation, self.threshold)
    }

    /// Checks if this operation has the same rotational part as `other`.
    #[must_use]
    pub fn has_same_rotation(&self, other: &Self) -> bool {
        let thresh = self.threshold.max(other.threshold);
        (self.rotation - other.rotation).amax() < thresh
    }

    /// Checks if the rotational part is the identity.
    #[must_use]
    pub fn is_identity_rotation(&self) -> bool {
        (self.rotation - Matrix3::identity()).amax() < self.threshold
    }

    /// Checks if the rotational part is the spatial inversion.
    #[must_use]
    pub fn is_inversion_rotation(&self) -> bool {
        (self.rotation + Matrix3::identity()).amax() < self.threshold
    }

    /// Checks if this operation is the identity, with a translation that vanishes modulo lattice
    /// translations.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.is_identity_rotation()
            && periodic_eq(&self.translation, &Vector3::zeros(), self.threshold)
    }
}

impl PartialEq for SymmetryOperation {
    /// Two operations are equal if their rotations agree and their translations agree modulo
    /// lattice translations, both within the looser of the two thresholds.
    fn eq(&self, other: &Self) -> bool {
        let thresh = self.threshold.max(other.threshold);
        self.has_same_rotation(other) && periodic_eq(&self.translation, &other.translation, thresh)
    }
}

impl fmt::Display for SymmetryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.xyz)
    }
}

// ==============
// Linear parsing
// ==============

/// A linear form $`\mathbf{c} \cdot (x, y, z) + d`$.
#[derive(Clone, Copy, Debug)]
struct Affine {
    coefficients: Vector3<f64>,
    constant: f64,
}

impl Affine {
    fn constant(value: f64) -> Self {
        Self {
            coefficients: Vector3::zeros(),
            constant: value,
        }
    }

    fn variable(index: usize) -> Self {
        let mut coefficients = Vector3::zeros();
        coefficients[index] = 1.0;
        Self {
            coefficients,
            constant: 0.0,
        }
    }

    fn is_constant(&self) -> bool {
        self.coefficients.iter().all(|c| *c == 0.0)
    }

    fn scale(&self, factor: f64) -> Self {
        Self {
            coefficients: self.coefficients * factor,
            constant: self.constant * factor,
        }
    }

    fn add(&self, other: &Self) -> Self {
        Self {
            coefficients: self.coefficients + other.coefficients,
            constant: self.constant + other.constant,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Token {
    Number(f64),
    Variable(usize),
    Plus,
    Minus,
    Star,
    Slash,
    LeftParen,
    RightParen,
}

fn tokenise(expr: &str) -> Result<Vec<Token>, anyhow::Error> {
    let mut tokens = Vec::new();
    let mut rest = expr;
    while !rest.trim().is_empty() {
        let caps = TOKEN_RE
            .captures(rest)
            .ok_or_else(|| format_err!("unexpected character sequence `{}`", rest.trim()))?;
        let token = if let Some(num) = caps.name("num") {
            Token::Number(num.as_str().parse::<f64>()?)
        } else if let Some(var) = caps.name("var") {
            match var.as_str().to_ascii_lowercase().as_str() {
                "x" => Token::Variable(0),
                "y" => Token::Variable(1),
                _ => Token::Variable(2),
            }
        } else {
            match caps.name("op").map(|op| op.as_str()) {
                Some("+") => Token::Plus,
                Some("-") => Token::Minus,
                Some("*") => Token::Star,
                Some("/") => Token::Slash,
                Some("(") => Token::LeftParen,
                Some(")") => Token::RightParen,
                _ => return Err(format_err!("unrecognised token in `{rest}`")),
            }
        };
        tokens.push(token);
        let consumed = caps
            .get(0)
            .map(|m| m.end())
            .ok_or_else(|| format_err!("empty token match"))?;
        rest = &rest[consumed..];
    }
    Ok(tokens)
}

/// A recursive-descent parser over the grammar
///
/// ```text
/// expr    := term (('+' | '-') term)*
/// term    := unary (('*' | '/')? unary)*
/// unary   := ('+' | '-') unary | primary
/// primary := number | variable | '(' expr ')'
/// ```
///
/// where juxtaposition such as `2x` denotes multiplication.
struct LinearParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl LinearParser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn expr(&mut self) -> Result<Affine, anyhow::Error> {
        let mut value = self.term()?;
        while let Some(token @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if token == Token::Plus {
                value.add(&rhs)
            } else {
                value.add(&rhs.scale(-1.0))
            };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<Affine, anyhow::Error> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    value = multiply(&value, &rhs)?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    ensure!(
                        rhs.is_constant(),
                        "division by an expression containing x, y or z"
                    );
                    ensure!(rhs.constant != 0.0, "division by zero");
                    value = value.scale(1.0 / rhs.constant);
                }
                Some(Token::Number(_) | Token::Variable(_) | Token::LeftParen) => {
                    let rhs = self.unary()?;
                    value = multiply(&value, &rhs)?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<Affine, anyhow::Error> {
        match self.peek() {
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(self.unary()?.scale(-1.0))
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Affine, anyhow::Error> {
        match self.next() {
            Some(Token::Number(value)) => Ok(Affine::constant(value)),
            Some(Token::Variable(index)) => Ok(Affine::variable(index)),
            Some(Token::LeftParen) => {
                let value = self.expr()?;
                match self.next() {
                    Some(Token::RightParen) => Ok(value),
                    _ => Err(format_err!("unbalanced parentheses")),
                }
            }
            Some(token) => Err(format_err!("unexpected token {token:?}")),
            None => Err(format_err!("unexpected end of expression")),
        }
    }
}

fn multiply(lhs: &Affine, rhs: &Affine) -> Result<Affine, anyhow::Error> {
    if lhs.is_constant() {
        Ok(rhs.scale(lhs.constant))
    } else if rhs.is_constant() {
        Ok(lhs.scale(rhs.constant))
    } else {
        Err(format_err!("product of two expressions containing x, y or z"))
    }
}

fn parse_component(component: &str) -> Result<Affine, anyhow::Error> {
    let tokens = tokenise(component)?;
    ensure!(!tokens.is_empty(), "empty component");
    let mut parser = LinearParser { tokens, pos: 0 };
    let value = parser.expr()?;
    ensure!(
        parser.pos == parser.tokens.len(),
        "trailing tokens after a complete expression"
    );
    Ok(value)
}

// ==========
// Formatting
// ==========

/// Formats a number as a small-denominator fraction (such as `1/2` or `-2/3`) when it is one
/// within `threshold`, and as a decimal otherwise.
fn format_fraction(value: f64, threshold: f64) -> String {
    let snapped = value.snap_fraction(threshold);
    if (snapped - value).abs() >= threshold {
        return format!("{value:.6}");
    }
    [1u32, 2, 3, 4, 6, 8, 12]
        .iter()
        .find_map(|&den| {
            let numerator = snapped * f64::from(den);
            if (numerator - numerator.round()).abs() < 1e-9 {
                let numerator = numerator.round() as i64;
                if den == 1 {
                    Some(format!("{numerator}"))
                } else {
                    Some(format!("{numerator}/{den}"))
                }
            } else {
                None
            }
        })
        .unwrap_or_else(|| format!("{value:.6}"))
}

/// Generates the parametric `x,y,z` form of an affine operation.
///
/// # Arguments
///
/// * `rotation` - The rotational part.
/// * `translation` - The translational part.
/// * `threshold` - The threshold below which coefficients are taken to vanish.
///
/// # Returns
///
/// The parametric form, e.g. `-y,x-y,z+1/3`.
#[must_use]
pub fn format_xyz(rotation: &Matrix3<f64>, translation: &Vector3<f64>, threshold: f64) -> String {
    (0..3)
        .map(|i| {
            let mut component = String::new();
            for (j, var) in ['x', 'y', 'z'].iter().enumerate() {
                let c = rotation[(i, j)];
                if c.abs() < threshold {
                    continue;
                }
                if (c - 1.0).abs() < threshold {
                    component.push_str(&format!("+{var}"));
                } else if (c + 1.0).abs() < threshold {
                    component.push_str(&format!("-{var}"));
                } else {
                    let coeff = format_fraction(c, threshold);
                    if coeff.starts_with('-') {
                        component.push_str(&format!("{coeff}*{var}"));
                    } else {
                        component.push_str(&format!("+{coeff}*{var}"));
                    }
                }
            }
            let t = translation[i];
            if t.abs() >= threshold {
                let constant = format_fraction(t, threshold);
                if constant.starts_with('-') {
                    component.push_str(&constant);
                } else {
                    component.push_str(&format!("+{constant}"));
                }
            }
            let component = component.trim_start_matches('+').to_string();
            if component.is_empty() {
                "0".to_string()
            } else {
                component
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}
