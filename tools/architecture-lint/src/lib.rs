//! Repo-local architecture lint for the lead-sync backend.
//!
//! The reconciler lives in `domain` and talks to the CRM, the database and
//! the clock only through `domain::ports`. The command line sits in
//! `inbound`; the HubSpot and Diesel adapters sit side by side in
//! `outbound`. The lint parses every production source under those three
//! trees, resolves `crate`, `self`, `super` and `lead_sync` paths to absolute
//! module paths and checks them against [`RULES`]:
//!
//! - `domain` never reaches adapters, configuration or test support, and
//!   only `domain::ports` may touch the async runtime
//! - `domain::ports` never depends on the reconciler it serves
//! - `domain::lead_reconciler` imports port types through the `ports` facade
//! - `inbound` never reaches `outbound` or the HTTP and database crates
//! - the HubSpot and persistence adapters never reach each other
//!
//! Test files (`tests.rs`, anything under a `tests/` directory) and items
//! gated behind `#[cfg(test)]` are not checked. The binary at
//! `backend/src/main.rs` is the composition root and is not linted.
//!
//! Run it with `cargo run -p architecture-lint`.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use syn::visit::Visit;

/// Library name used when adapters refer to the crate by name.
const CRATE_NAME: &str = "lead_sync";

/// Top-level modules of the library; bare paths starting with one of these
/// are treated as crate paths.
const CRATE_MODULES: [&str; 5] = ["config", "domain", "inbound", "outbound", "test_support"];

/// Source trees the lint walks.
const LINTED_TREES: [&str; 3] = ["domain", "inbound", "outbound"];

const DATABASE_CRATES: [&str; 4] = ["bb8", "diesel", "diesel_async", "diesel_migrations"];

/// What a rule forbids.
#[derive(Debug, Clone, Copy)]
enum Target {
    /// A crate module and everything below it.
    Module(&'static [&'static str]),
    /// An external crate.
    Crate(&'static str),
    /// Any external crate from the group.
    Crates(&'static [&'static str]),
    /// Submodules of the facade; only its re-exports may be named.
    BehindFacade(&'static [&'static str]),
}

/// A boundary rule applied to every module under `scope`.
#[derive(Debug, Clone, Copy)]
struct Rule {
    scope: &'static [&'static str],
    exempt: &'static [&'static [&'static str]],
    target: Target,
}

impl Rule {
    const fn new(scope: &'static [&'static str], target: Target) -> Self {
        Self {
            scope,
            exempt: &[],
            target,
        }
    }

    const fn except(self, exempt: &'static [&'static [&'static str]]) -> Self {
        Self { exempt, ..self }
    }

    fn applies_to(&self, module: &[String]) -> bool {
        starts_with(module, self.scope) && !self.exempt.iter().any(|ex| starts_with(module, ex))
    }

    fn violation(&self, reference: &Reference) -> Option<String> {
        let scope = self.scope.join("::");
        match (self.target, reference) {
            (Target::Module(target), Reference::Internal(path)) if starts_with(path, target) => {
                Some(format!("{scope} must not depend on crate::{}", target.join("::")))
            }
            (Target::BehindFacade(facade), Reference::Internal(path)) => {
                let inner = path.get(facade.len()).filter(|_| starts_with(path, facade))?;
                is_module_name(inner).then(|| {
                    format!(
                        "{scope} must import through crate::{} instead of its submodule `{inner}`",
                        facade.join("::")
                    )
                })
            }
            (Target::Crate(name), Reference::External(root)) if root.as_str() == name => {
                Some(format!("{scope} must not depend on external crate `{name}`"))
            }
            (Target::Crates(names), Reference::External(root)) => names
                .iter()
                .find(|name| **name == root.as_str())
                .map(|name| format!("{scope} must not depend on external crate `{name}`")),
            _ => None,
        }
    }
}

/// Boundary rules for the backend, evaluated in order.
const RULES: &[Rule] = &[
    Rule::new(&["domain"], Target::Module(&["inbound"])),
    Rule::new(&["domain"], Target::Module(&["outbound"])),
    Rule::new(&["domain"], Target::Module(&["config"])),
    Rule::new(&["domain"], Target::Module(&["test_support"])),
    Rule::new(&["domain"], Target::Crates(&DATABASE_CRATES)),
    Rule::new(&["domain"], Target::Crates(&["clap", "color_eyre", "ortho_config", "reqwest"])),
    Rule::new(&["domain"], Target::Crate("tokio")).except(&[&["domain", "ports"]]),
    Rule::new(&["domain", "ports"], Target::Module(&["domain", "lead_reconciler"])),
    Rule::new(&["domain", "lead_reconciler"], Target::BehindFacade(&["domain", "ports"])),
    Rule::new(&["inbound"], Target::Module(&["outbound"])),
    Rule::new(&["inbound"], Target::Module(&["test_support"])),
    Rule::new(&["inbound"], Target::Crates(&DATABASE_CRATES)),
    Rule::new(&["inbound"], Target::Crate("reqwest")),
    Rule::new(&["outbound"], Target::Module(&["inbound"])),
    Rule::new(&["outbound"], Target::Module(&["test_support"])),
    Rule::new(&["outbound"], Target::Crate("clap")),
    Rule::new(&["outbound", "hubspot"], Target::Module(&["outbound", "persistence"])),
    Rule::new(&["outbound", "hubspot"], Target::Crates(&DATABASE_CRATES)),
    Rule::new(&["outbound", "persistence"], Target::Module(&["outbound", "hubspot"])),
    Rule::new(&["outbound", "persistence"], Target::Crate("reqwest")),
];

fn starts_with(path: &[String], prefix: &[&str]) -> bool {
    path.len() >= prefix.len() && path.iter().zip(prefix).all(|(seg, want)| seg == want)
}

fn is_module_name(segment: &str) -> bool {
    segment
        .chars()
        .next()
        .is_some_and(|first| first.is_ascii_lowercase())
}

/// A single boundary violation discovered by the linter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File path relative to `backend/src`.
    pub file: PathBuf,
    /// Human-readable description of the violated rule.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.message)
    }
}

/// Failure modes returned by the architecture lint.
#[derive(Debug)]
pub enum ArchitectureLintError {
    /// Filesystem traversal or reading failed.
    Io(io::Error),
    /// The file could not be parsed or sits outside the linted trees.
    Parse { file: PathBuf, message: String },
    /// One or more boundary violations were found.
    Violations(Vec<Violation>),
}

impl fmt::Display for ArchitectureLintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error while linting architecture: {err}"),
            Self::Parse { file, message } => write!(
                f,
                "failed to lint {}: {message}",
                file.display()
            ),
            Self::Violations(violations) => {
                writeln!(f, "Architecture boundary violations:")?;
                for violation in violations {
                    writeln!(f, "- {violation}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ArchitectureLintError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ArchitectureLintError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Lint the backend sources on disk and return how many production files
/// were checked.
///
/// `backend_dir` must be the `backend/` directory at the repository root.
pub fn lint_backend_sources(backend_dir: &Path) -> Result<usize, ArchitectureLintError> {
    let src_dir = backend_dir.join("src");
    let mut sources = Vec::new();
    for tree in LINTED_TREES {
        let dir = src_dir.join(tree);
        if dir.exists() {
            collect_sources_under(&src_dir, &dir, &mut sources)?;
        }
    }
    lint_sources(&sources)?;
    Ok(sources.len())
}

/// Lint the provided sources. Test files among them are skipped.
pub fn lint_sources(sources: &[LintSource]) -> Result<(), ArchitectureLintError> {
    let mut violations = Vec::new();

    for source in sources.iter().filter(|source| !is_test_file(&source.file)) {
        let module = module_path(&source.file).ok_or_else(|| ArchitectureLintError::Parse {
            file: source.file.clone(),
            message: "file is outside the domain, inbound and outbound trees".to_owned(),
        })?;
        let parsed =
            syn::parse_file(&source.contents).map_err(|err| ArchitectureLintError::Parse {
                file: source.file.clone(),
                message: err.to_string(),
            })?;

        let mut collector = ReferenceCollector::new(module.clone());
        collector.visit_file(&parsed);

        let messages = RULES
            .iter()
            .filter(|rule| rule.applies_to(&module))
            .flat_map(|rule| {
                collector
                    .references
                    .iter()
                    .filter_map(move |reference| rule.violation(reference))
            })
            .collect::<BTreeSet<_>>();
        violations.extend(messages.into_iter().map(|message| Violation {
            file: source.file.clone(),
            message,
        }));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ArchitectureLintError::Violations(violations))
    }
}

/// A Rust source file to be linted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSource {
    /// Path relative to `backend/src`.
    pub file: PathBuf,
    pub contents: String,
}

fn is_test_file(relative_path: &Path) -> bool {
    relative_path.file_stem().is_some_and(|stem| stem == "tests")
        || relative_path
            .parent()
            .is_some_and(|parent| parent.components().any(|part| part.as_os_str() == "tests"))
}

/// Module path of a file under `backend/src`, e.g. `outbound/hubspot/mod.rs`
/// is `outbound::hubspot`.
fn module_path(relative_path: &Path) -> Option<Vec<String>> {
    let mut segments = relative_path
        .with_extension("")
        .components()
        .map(|part| part.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    if segments.last().is_some_and(|last| last == "mod") {
        segments.pop();
    }
    let tree = segments.first()?;
    LINTED_TREES.contains(&tree.as_str()).then_some(segments)
}

/// A path seen in a source file, after resolution.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Reference {
    /// Absolute module path inside the crate.
    Internal(Vec<String>),
    /// Root of a path into another crate (or an unresolved local name).
    External(String),
}

struct ReferenceCollector {
    module: Vec<String>,
    references: BTreeSet<Reference>,
}

impl ReferenceCollector {
    fn new(module: Vec<String>) -> Self {
        Self {
            module,
            references: BTreeSet::new(),
        }
    }

    fn resolve(&self, segments: &[String]) -> Option<Reference> {
        let (first, rest) = segments.split_first()?;
        let reference = match first.as_str() {
            "crate" => Reference::Internal(rest.to_vec()),
            name if name == CRATE_NAME => Reference::Internal(rest.to_vec()),
            "self" => Reference::Internal([self.module.as_slice(), rest].concat()),
            "super" => {
                let ups = segments.iter().take_while(|seg| *seg == "super").count();
                let base = self.module.len().saturating_sub(ups);
                Reference::Internal([&self.module[..base], &segments[ups..]].concat())
            }
            name if !rest.is_empty() && CRATE_MODULES.contains(&name) => {
                Reference::Internal(segments.to_vec())
            }
            name => Reference::External(name.to_owned()),
        };
        Some(reference)
    }

    fn record(&mut self, segments: &[String]) {
        if let Some(reference) = self.resolve(segments) {
            self.references.insert(reference);
        }
    }

    fn record_use_tree(&mut self, tree: &syn::UseTree, prefix: &mut Vec<String>) {
        match tree {
            syn::UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.record_use_tree(&path.tree, prefix);
                prefix.pop();
            }
            syn::UseTree::Name(syn::UseName { ident })
            | syn::UseTree::Rename(syn::UseRename { ident, .. }) => {
                prefix.push(ident.to_string());
                self.record(prefix);
                prefix.pop();
            }
            syn::UseTree::Glob(_) => {
                prefix.push("*".to_owned());
                self.record(prefix);
                prefix.pop();
            }
            syn::UseTree::Group(group) => {
                for item in &group.items {
                    self.record_use_tree(item, prefix);
                }
            }
        }
    }
}

fn is_cfg_test(attrs: &[syn::Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path().is_ident("cfg")
            && matches!(&attr.meta, syn::Meta::List(list) if list.tokens.to_string() == "test")
    })
}

fn item_attrs(item: &syn::Item) -> &[syn::Attribute] {
    match item {
        syn::Item::Const(item) => &item.attrs,
        syn::Item::Enum(item) => &item.attrs,
        syn::Item::Fn(item) => &item.attrs,
        syn::Item::Impl(item) => &item.attrs,
        syn::Item::Macro(item) => &item.attrs,
        syn::Item::Mod(item) => &item.attrs,
        syn::Item::Static(item) => &item.attrs,
        syn::Item::Struct(item) => &item.attrs,
        syn::Item::Trait(item) => &item.attrs,
        syn::Item::Type(item) => &item.attrs,
        syn::Item::Use(item) => &item.attrs,
        _ => &[],
    }
}

impl<'ast> Visit<'ast> for ReferenceCollector {
    fn visit_item(&mut self, node: &'ast syn::Item) {
        if !is_cfg_test(item_attrs(node)) {
            syn::visit::visit_item(self, node);
        }
    }

    fn visit_impl_item(&mut self, node: &'ast syn::ImplItem) {
        let skip = matches!(node, syn::ImplItem::Fn(item) if is_cfg_test(&item.attrs));
        if !skip {
            syn::visit::visit_impl_item(self, node);
        }
    }

    fn visit_item_mod(&mut self, node: &'ast syn::ItemMod) {
        if node.content.is_none() {
            return;
        }
        self.module.push(node.ident.to_string());
        syn::visit::visit_item_mod(self, node);
        self.module.pop();
    }

    fn visit_item_use(&mut self, node: &'ast syn::ItemUse) {
        self.record_use_tree(&node.tree, &mut Vec::new());
    }

    fn visit_path(&mut self, node: &'ast syn::Path) {
        let segments = node
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect::<Vec<_>>();
        self.record(&segments);
        syn::visit::visit_path(self, node);
    }
}

fn collect_sources_under(
    src_root: &Path,
    current: &Path,
    sources: &mut Vec<LintSource>,
) -> Result<(), ArchitectureLintError> {
    for entry in fs::read_dir(current)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_sources_under(src_root, &path, sources)?;
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some("rs") {
            continue;
        }

        let relative = path
            .strip_prefix(src_root)
            .map_err(|err| ArchitectureLintError::Parse {
                file: path.clone(),
                message: err.to_string(),
            })?
            .to_path_buf();
        if is_test_file(&relative) {
            continue;
        }
        let contents = fs::read_to_string(&path)?;
        sources.push(LintSource {
            file: relative,
            contents,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests;
