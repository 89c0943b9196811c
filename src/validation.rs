//! Static validation of an injector's provider graph.
//!
//! Walks every provider visible from an injector without building anything
//! and reports what resolution would trip over: dependencies no scope
//! provides and dependency cycles. It also warns about cached providers that
//! capture a transient dependency, since such a dependency is only ever built
//! once for them.

use std::collections::HashMap;
use std::fmt;

use crate::injector::Injector;
use crate::lifetime::Lifetime;
use crate::provider::ProviderTable;
use crate::token::Token;

/// A problem that makes resolution fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `dependency` is required by `required_by` but no scope provides it.
    MissingDependency { required_by: Token, dependency: Token },
    /// Dependency cycle; the first token is repeated at the end.
    CyclicDependency { path: Vec<Token> },
}

/// A configuration that resolves but probably does not do what was meant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// A cached provider depends on a transient one and will keep the single
    /// instance it was built with.
    CachedDependsOnTransient { cached: Token, transient: Token },
}

/// Outcome of [`Injector::validate`].
///
/// # Examples
///
/// ```
/// use stratum_di::{Injector, ProviderDescriptor, ProviderSet, Token, ValidationError};
///
/// let mut providers = ProviderSet::new();
/// providers.add("a", ProviderDescriptor::factory(vec![Token::named("b")], |_| Ok(1u8)));
/// providers.add("b", ProviderDescriptor::factory(vec![Token::named("a")], |_| Ok(2u8)));
/// providers.add("c", ProviderDescriptor::factory(vec![Token::named("nope")], |_| Ok(3u8)));
///
/// let report = Injector::root(providers).validate().unwrap_err();
/// assert_eq!(report.errors.len(), 2);
/// assert!(report.errors.contains(&ValidationError::MissingDependency {
///     required_by: Token::named("c"),
///     dependency: Token::named("nope"),
/// }));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Missing `(required_by, dependency)` pairs.
    pub fn missing(&self) -> impl Iterator<Item = (&Token, &Token)> {
        self.errors.iter().filter_map(|e| match e {
            ValidationError::MissingDependency { required_by, dependency } => Some((required_by, dependency)),
            _ => None,
        })
    }

    pub fn cycles(&self) -> impl Iterator<Item = &[Token]> {
        self.errors.iter().filter_map(|e| match e {
            ValidationError::CyclicDependency { path } => Some(path.as_slice()),
            _ => None,
        })
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingDependency { required_by, dependency } => {
                write!(f, "{} requires {}, which has no provider", required_by, dependency)
            }
            ValidationError::CyclicDependency { path } => {
                let joined: Vec<String> = path.iter().map(|t| t.to_string()).collect();
                write!(f, "cyclic dependency: {}", joined.join(" -> "))
            }
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} validation error(s), {} warning(s)",
            self.errors.len(),
            self.warnings.len()
        )?;
        for error in &self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

struct Walker {
    // Snapshot of each scope's table, index 0 is the injector being validated.
    tables: Vec<ProviderTable>,
    marks: HashMap<(usize, Token), Mark>,
    stack: Vec<Token>,
    report: ValidationReport,
}

impl Walker {
    /// Scope that would serve `token` when asked at `level`, with its
    /// dependencies and lifetime.
    fn owner(&self, level: usize, token: &Token) -> Option<(usize, Vec<Token>, Lifetime)> {
        self.tables
            .iter()
            .enumerate()
            .skip(level)
            .find_map(|(owner, table)| {
                table
                    .lookup_local(token)
                    .map(|d| (owner, d.dependencies().to_vec(), d.lifetime()))
            })
    }

    fn visit(&mut self, level: usize, token: &Token) {
        let Some((owner, deps, lifetime)) = self.owner(level, token) else {
            return;
        };
        let key = (owner, token.clone());
        if self.marks.contains_key(&key) {
            return;
        }
        self.marks.insert(key.clone(), Mark::Visiting);
        self.stack.push(token.clone());

        for dep in &deps {
            // Cycles are detected by token, exactly as resolution does.
            if let Some(start) = self.stack.iter().position(|t| t == dep) {
                let mut path = self.stack[start..].to_vec();
                path.push(dep.clone());
                self.push_error(ValidationError::CyclicDependency { path });
                continue;
            }
            match self.owner(owner, dep) {
                None => self.push_error(ValidationError::MissingDependency {
                    required_by: token.clone(),
                    dependency: dep.clone(),
                }),
                Some((_, _, dep_lifetime)) => {
                    if lifetime.is_cacheable() && !dep_lifetime.is_cacheable() {
                        let warning = ValidationWarning::CachedDependsOnTransient {
                            cached: token.clone(),
                            transient: dep.clone(),
                        };
                        if !self.report.warnings.contains(&warning) {
                            self.report.warnings.push(warning);
                        }
                    }
                    self.visit(owner, dep);
                }
            }
        }

        self.stack.pop();
        self.marks.insert(key, Mark::Done);
    }

    fn push_error(&mut self, error: ValidationError) {
        if !self.report.errors.contains(&error) {
            self.report.errors.push(error);
        }
    }
}

impl Injector {
    /// Checks every provider visible from this injector for missing
    /// dependencies and cycles without building anything.
    pub fn validate(&self) -> Result<(), ValidationReport> {
        let report = self.validation_report();
        if report.is_valid() {
            Ok(())
        } else {
            Err(report)
        }
    }

    /// Full report, warnings included, even when there are no errors.
    pub fn validation_report(&self) -> ValidationReport {
        let tables: Vec<ProviderTable> = self
            .ancestry()
            .map(|injector| injector.table_snapshot())
            .collect();

        let mut entry_points: Vec<Token> = Vec::new();
        for table in &tables {
            for token in table.tokens() {
                if !entry_points.contains(token) {
                    entry_points.push(token.clone());
                }
            }
        }

        let mut walker = Walker {
            tables,
            marks: HashMap::new(),
            stack: Vec::new(),
            report: ValidationReport::default(),
        };
        for token in &entry_points {
            walker.visit(0, token);
        }
        debug_assert!(walker.marks.values().all(|m| *m == Mark::Done));
        walker.report
    }
}
