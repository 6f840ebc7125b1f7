//! Turns a `-p` specification into an ordered, duplicate-free target list.

use super::catalog::{Catalog, CatalogSource};
use super::groups::{self, ALL_KEYWORD};
use super::BuildTarget;
use std::collections::HashSet;
use std::fmt;

/// Inputs besides the spec string and the catalog.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Expand a bare OS name to every catalog architecture instead of the
    /// host's native one.
    pub all_archs: bool,
    /// Host architecture in `GOARCH` spelling.
    pub native_arch: String,
}

/// A token that contributed nothing, or contributed from the fallback list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionWarning {
    /// `all` was expanded from the static list because discovery failed.
    CatalogUnavailable { reason: String },
    /// A token with `/` that is not exactly `os/arch`.
    Malformed { token: String },
    /// `--all` with an OS the catalog has never heard of.
    UnknownOs { os: String },
    /// Bare OS name whose architectures do not include the host's.
    UnsupportedNativeArch {
        os: String,
        native_arch: String,
        supported: Vec<String>,
    },
}

impl fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CatalogUnavailable { reason } => {
                write!(f, "platform discovery failed, using built-in list: {reason}")
            }
            Self::Malformed { token } => {
                write!(f, "'{token}' is not a valid os/arch pair, ignoring")
            }
            Self::UnknownOs { os } => write!(f, "operating system '{os}' is not supported"),
            Self::UnsupportedNativeArch {
                os,
                native_arch,
                supported,
            } if supported.is_empty() => write!(
                f,
                "'{os}' does not support native architecture {native_arch} (no known architectures)"
            ),
            Self::UnsupportedNativeArch {
                os,
                native_arch,
                supported,
            } => write!(
                f,
                "'{os}' does not support native architecture {native_arch}, supported: {} (use --all to build them)",
                supported.join(", ")
            ),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub targets: Vec<BuildTarget>,
    pub warnings: Vec<ResolutionWarning>,
}

/// Resolve a comma-separated platform specification.
///
/// Never fails; unresolvable tokens become warnings. An empty result is the
/// caller's problem.
pub fn resolve(spec: &str, options: &ResolveOptions, catalog: &Catalog) -> Resolution {
    let mut resolution = Resolution::default();
    let mut seen = HashSet::new();

    for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        for target in resolve_token(token, options, catalog, &mut resolution.warnings) {
            if seen.insert((target.os().to_string(), target.arch().to_string())) {
                resolution.targets.push(target);
            }
        }
    }

    resolution
}

fn resolve_token(
    token: &str,
    options: &ResolveOptions,
    catalog: &Catalog,
    warnings: &mut Vec<ResolutionWarning>,
) -> Vec<BuildTarget> {
    if token == ALL_KEYWORD {
        if let CatalogSource::Fallback(reason) = catalog.source() {
            warnings.push(ResolutionWarning::CatalogUnavailable {
                reason: reason.clone(),
            });
        }
        return catalog.entries().to_vec();
    }

    if let Some(labels) = groups::group(token) {
        return labels
            .iter()
            .filter_map(|label| BuildTarget::parse(label))
            .collect();
    }

    if token.contains('/') {
        return match BuildTarget::parse(token) {
            Some(target) => vec![target],
            None => {
                warnings.push(ResolutionWarning::Malformed {
                    token: token.to_string(),
                });
                Vec::new()
            }
        };
    }

    let supported = catalog.archs_for(token);

    if options.all_archs {
        if supported.is_empty() {
            warnings.push(ResolutionWarning::UnknownOs {
                os: token.to_string(),
            });
        }
        return supported
            .into_iter()
            .map(|arch| BuildTarget::new(token, arch))
            .collect();
    }

    if supported.contains(&options.native_arch.as_str()) {
        vec![BuildTarget::new(token, &options.native_arch)]
    } else {
        warnings.push(ResolutionWarning::UnsupportedNativeArch {
            os: token.to_string(),
            native_arch: options.native_arch.clone(),
            supported: supported.into_iter().map(str::to_string).collect(),
        });
        Vec::new()
    }
}
