//! Path substitution rules for notebook sources.
//!
//! Each rule is a `(pattern, replacement)` pair held as data in an ordered table. A single
//! engine, [`PathRules`], compiles a table and applies it sequentially: every rule sees the
//! output of the rules before it. Replacement forms are chosen so that running the whole
//! table over already-normalised text changes nothing.

use crate::{PrepError, PrepResult};
use regex::{NoExpand, Regex};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// How the matched text is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replacement {
    /// Inserted verbatim; `$` has no special meaning.
    Literal(&'static str),
    /// Expanded against the match's capture groups (`${1}`).
    Template(&'static str),
}

/// The kind of path expression a rule targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleCategory {
    AbsolutePath,
    PathConstruction,
    ParentDirectory,
    PrintStatement,
}

/// A substitution rule before compilation.
#[derive(Debug, Clone, Copy)]
pub struct RuleSpec {
    pub name: &'static str,
    pub category: RuleCategory,
    pub pattern: &'static str,
    pub replacement: Replacement,
}

const fn rule(
    name: &'static str,
    category: RuleCategory,
    pattern: &'static str,
    replacement: Replacement,
) -> RuleSpec {
    RuleSpec {
        name,
        category,
        pattern,
        replacement,
    }
}

use Replacement::{Literal, Template};
use RuleCategory::{AbsolutePath, ParentDirectory, PathConstruction, PrintStatement};

/// First pass: absolute paths, the notebook_dir/base_path idioms, `../` literals and the
/// diagnostic prints that echo them.
pub const STANDARD_RULES: &[RuleSpec] = &[
    rule("absolute-users", AbsolutePath, r#"/Users/[^"']+"#, Literal(".")),
    rule("absolute-y-drive", AbsolutePath, r#"Y:\\[^"']+"#, Literal(".")),
    rule("absolute-c-drive", AbsolutePath, r#"C:\\[^"']+"#, Literal(".")),
    rule(
        "notebook-dir-cwd",
        PathConstruction,
        r"notebook_dir\s*=\s*Path\.cwd\(\)\.resolve\(\)",
        Literal("notebook_dir = Path('.').resolve()"),
    ),
    rule(
        "data-path-parent",
        PathConstruction,
        r#"data_path\s*=\s*\(notebook_dir\s*/\s*'\.\.'\s*/\s*['"]Data['"]\)\.resolve\(\)"#,
        Literal("data_path = Path('.').resolve()"),
    ),
    rule(
        "data-path-grandparent",
        PathConstruction,
        r#"data_path\s*=\s*\(notebook_dir\s*/\s*'\.\.'\s*/\s*'\.\.'\s*/\s*['"]Data['"]\)\.resolve\(\)"#,
        Literal("data_path = Path('.').resolve()"),
    ),
    rule(
        "plots-dir-parent",
        PathConstruction,
        r#"plots_dir\s*=\s*\(notebook_dir\s*/\s*'\.\.'\s*/\s*['"]plots['"]\)\.resolve\(\)"#,
        Literal("plots_dir = Path('.').resolve()"),
    ),
    rule(
        "data-dir-literal",
        PathConstruction,
        r#"DATA_DIR\s*=\s*r?["'][^"']+["']"#,
        Literal("DATA_DIR = '.'"),
    ),
    rule(
        "data-dir-parent",
        PathConstruction,
        r#"DATA_DIR\s*=\s*\(notebook_dir\s*/\s*'\.\.'\s*/\s*['"]Data['"]\)\.resolve\(\)"#,
        Literal("DATA_DIR = Path('.').resolve()"),
    ),
    rule(
        "base-path-cwd",
        PathConstruction,
        r"base_path\s*=\s*Path\.cwd\(\)",
        Literal("base_path = Path('.').resolve()"),
    ),
    rule(
        "base-path-code-parent",
        PathConstruction,
        r"if base_path\.name == 'code':\s*base_path = base_path\.parent",
        Literal("if False:  # Always use current directory"),
    ),
    rule(
        "data-path-base",
        PathConstruction,
        r"data_path\s*=\s*base_path\s*/\s*'Data'",
        Literal("data_path = Path('.').resolve()"),
    ),
    rule(
        "ecg-data-path",
        PathConstruction,
        r"ecg_data_path\s*=\s*data_path\s*/\s*'time-series-project2025'",
        Literal("ecg_data_path = Path('.').resolve() / 'time-series-project2025'"),
    ),
    rule(
        "plots-parent-slash",
        ParentDirectory,
        r#"(['"])\.\./plots/"#,
        Template("${1}./plots/"),
    ),
    rule(
        "data-parent-slash",
        ParentDirectory,
        r#"(['"])\.\./Data/"#,
        Template("${1}./"),
    ),
    rule(
        "print-working-dir",
        PrintStatement,
        r#"print\(f["']Working directory:[^"']+["']\)"#,
        Literal("print(f'Working directory: {Path.cwd()}')"),
    ),
    rule(
        "print-data-path",
        PrintStatement,
        r#"print\(f["']Data path:[^"']+["']\)"#,
        Literal("print(f'Data path: {data_path}')"),
    ),
    rule(
        "print-plots-path",
        PrintStatement,
        r#"print\(f["']Plots path:[^"']+["']\)"#,
        Literal("print(f'Plots path: {plots_dir}')"),
    ),
];

/// Second pass: `DATA_DIR`/`OG_DATA_DIR` idioms with either quote style, bare `../plots`,
/// save-location prints and escaped Windows paths.
pub const COMPREHENSIVE_RULES: &[RuleSpec] = &[
    rule(
        "data-dir-grandparent",
        PathConstruction,
        r#"DATA_DIR\s*=\s*\(notebook_dir\s*/\s*['"]\.\.['"]\s*/\s*['"]\.\.['"]\s*/\s*['"]Data['"]\)\.resolve\(\)"#,
        Literal("DATA_DIR = Path('.').resolve()"),
    ),
    rule(
        "data-dir-parent-any-quote",
        PathConstruction,
        r#"DATA_DIR\s*=\s*\(notebook_dir\s*/\s*['"]\.\.['"]\s*/\s*['"]Data['"]\)\.resolve\(\)"#,
        Literal("DATA_DIR = Path('.').resolve()"),
    ),
    rule(
        "og-data-dir-grandparent",
        PathConstruction,
        r#"OG_DATA_DIR\s*=\s*\(notebook_dir\s*/\s*['"]\.\.['"]\s*/\s*['"]\.\.['"]\s*/\s*['"]Data['"]\)\.resolve\(\)"#,
        Literal("OG_DATA_DIR = Path('.').resolve()"),
    ),
    rule(
        "og-data-dir-parent",
        PathConstruction,
        r#"OG_DATA_DIR\s*=\s*\(notebook_dir\s*/\s*['"]\.\.['"]\s*/\s*['"]Data['"]\)\.resolve\(\)"#,
        Literal("OG_DATA_DIR = Path('.').resolve()"),
    ),
    rule(
        "plots-parent",
        ParentDirectory,
        r#"(['"])\.\./plots"#,
        Template("${1}./plots"),
    ),
    // The original locations cannot be rebuilt safely, so the print is dropped.
    rule(
        "print-saved-to",
        PrintStatement,
        r#"print\(f["']\s*(?:Correlation matrix|Boxplots|Clustered data) saved to:[^"']*["']\)"#,
        Literal("# Path updated to relative"),
    ),
    rule(
        "data-dir-argument",
        PathConstruction,
        r"data_dir\s*=\s*DATA_DIR",
        Literal("data_dir = Path('.')"),
    ),
    rule(
        "fstring-escaped-y-drive",
        AbsolutePath,
        r#"f["']\{[^}]*\}Y:\\\\[^"']*["']"#,
        Literal("f'{Path.cwd()}'"),
    ),
    rule(
        "escaped-y-drive",
        AbsolutePath,
        r#"Y:\\\\[^"'\s]*"#,
        Literal("."),
    ),
];

/// Which rule tables to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleSet {
    Standard,
    Comprehensive,
    /// Standard followed by comprehensive.
    #[default]
    All,
}

impl RuleSet {
    /// The rule specs of this set, in application order.
    pub fn specs(self) -> impl Iterator<Item = &'static RuleSpec> {
        let (standard, comprehensive): (&[RuleSpec], &[RuleSpec]) = match self {
            RuleSet::Standard => (STANDARD_RULES, &[]),
            RuleSet::Comprehensive => (&[], COMPREHENSIVE_RULES),
            RuleSet::All => (STANDARD_RULES, COMPREHENSIVE_RULES),
        };
        standard.iter().chain(comprehensive.iter())
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuleSet::Standard => "standard",
            RuleSet::Comprehensive => "comprehensive",
            RuleSet::All => "all",
        };
        f.write_str(name)
    }
}

impl FromStr for RuleSet {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(RuleSet::Standard),
            "comprehensive" => Ok(RuleSet::Comprehensive),
            "all" => Ok(RuleSet::All),
            other => Err(PrepError::InvalidInput(format!(
                "unknown rule set '{}' (expected standard, comprehensive or all)",
                other
            ))),
        }
    }
}

/// A rule with its pattern compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    spec: &'static RuleSpec,
    regex: Regex,
}

impl CompiledRule {
    fn compile(spec: &'static RuleSpec) -> PrepResult<Self> {
        let regex = Regex::new(spec.pattern).map_err(|source| PrepError::InvalidRule {
            name: spec.name,
            source,
        })?;
        Ok(Self { spec, regex })
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn category(&self) -> RuleCategory {
        self.spec.category
    }

    /// Replaces every match in `text`. Borrowed output means the rule did not match.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match self.spec.replacement {
            Literal(replacement) => self.regex.replace_all(text, NoExpand(replacement)),
            Template(template) => self.regex.replace_all(text, template),
        }
    }
}

/// An ordered, compiled rule table.
#[derive(Debug, Clone)]
pub struct PathRules {
    rules: Vec<CompiledRule>,
}

impl PathRules {
    /// Compiles the rules of `set` in application order.
    ///
    /// # Errors
    ///
    /// Returns `PrepError::InvalidRule` naming the first rule whose pattern fails to compile.
    pub fn for_set(set: RuleSet) -> PrepResult<Self> {
        let rules = set
            .specs()
            .map(CompiledRule::compile)
            .collect::<PrepResult<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules.iter()
    }

    /// Applies every rule in order, each to the output of the previous one.
    pub fn apply(&self, text: &str) -> String {
        let mut current = text.to_owned();
        for rule in &self.rules {
            let next = match rule.apply(&current) {
                Cow::Borrowed(_) => continue,
                Cow::Owned(next) => next,
            };
            tracing::trace!(rule = rule.name(), "substitution rule matched");
            current = next;
        }
        current
    }

    /// Applies the single rule called `name`.
    ///
    /// # Errors
    ///
    /// Returns `PrepError::UnknownRule` if no rule in this table has that name.
    pub fn apply_rule(&self, name: &str, text: &str) -> PrepResult<String> {
        let rule = self
            .rules
            .iter()
            .find(|rule| rule.name() == name)
            .ok_or_else(|| PrepError::UnknownRule(name.to_owned()))?;
        Ok(rule.apply(text).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn all_rules() -> PathRules {
        PathRules::for_set(RuleSet::All).unwrap()
    }

    #[test]
    fn test_every_pattern_compiles() {
        let rules = all_rules();
        assert_eq!(
            rules.len(),
            STANDARD_RULES.len() + COMPREHENSIVE_RULES.len()
        );
    }

    #[test]
    fn test_rule_names_are_unique() {
        let mut seen = HashSet::new();
        for spec in RuleSet::All.specs() {
            assert!(seen.insert(spec.name), "duplicate rule name {}", spec.name);
        }
    }

    #[test]
    fn test_rule_set_order() {
        let names: Vec<_> = RuleSet::All.specs().map(|s| s.name).collect();
        assert_eq!(names.first(), Some(&"absolute-users"));
        assert_eq!(names.last(), Some(&"escaped-y-drive"));
        assert_eq!(
            RuleSet::Comprehensive.specs().next().map(|s| s.name),
            Some("data-dir-grandparent")
        );
    }

    #[test]
    fn test_rule_set_parse_and_display() {
        for set in [RuleSet::Standard, RuleSet::Comprehensive, RuleSet::All] {
            assert_eq!(set.to_string().parse::<RuleSet>().unwrap(), set);
        }
        assert_eq!(" ALL ".parse::<RuleSet>().unwrap(), RuleSet::All);
        assert!("none".parse::<RuleSet>().is_err());
    }

    #[test]
    fn test_absolute_paths_become_current_dir() {
        let rules = all_rules();
        let text = "df = pd.read_csv('/Users/anna/Desktop/project/Data/ecg.csv')\n";
        assert_eq!(
            rules.apply_rule("absolute-users", text).unwrap(),
            "df = pd.read_csv('.')\n"
        );

        let text = r#"path = r"C:\Users\anna\Data\ecg.csv""#;
        assert_eq!(
            rules.apply_rule("absolute-c-drive", text).unwrap(),
            r#"path = r".""#
        );
    }

    #[test]
    fn test_base_path_rule_is_idempotent() {
        let rules = all_rules();
        let text = "data_path = base_path / 'Data'\nprint(data_path)";
        let once = rules.apply_rule("data-path-base", text).unwrap();
        assert_eq!(once, "data_path = Path('.').resolve()\nprint(data_path)");
        let twice = rules.apply_rule("data-path-base", &once).unwrap();
        assert_eq!(twice, once);
    }

    #[test]
    fn test_base_path_code_parent_spans_lines() {
        let rules = all_rules();
        let text = "base_path = Path.cwd()\nif base_path.name == 'code':\n    base_path = base_path.parent\n";
        assert_eq!(
            rules.apply(text),
            "base_path = Path('.').resolve()\nif False:  # Always use current directory\n"
        );
    }

    #[test]
    fn test_notebook_dir_idioms() {
        let rules = all_rules();
        let text = "notebook_dir = Path.cwd().resolve()\n\
                    data_path = (notebook_dir / '..' / '..' / 'Data').resolve()\n\
                    plots_dir = (notebook_dir / '..' / \"plots\").resolve()\n";
        assert_eq!(
            rules.apply(text),
            "notebook_dir = Path('.').resolve()\n\
             data_path = Path('.').resolve()\n\
             plots_dir = Path('.').resolve()\n"
        );
    }

    #[test]
    fn test_parent_directory_templates_keep_quote_style() {
        let rules = all_rules();
        assert_eq!(
            rules.apply("plt.savefig(\"../plots/hist.png\")"),
            "plt.savefig(\"./plots/hist.png\")"
        );
        assert_eq!(
            rules.apply("pd.read_csv('../Data/labels.csv')"),
            "pd.read_csv('./labels.csv')"
        );
        assert_eq!(
            rules.apply_rule("plots-parent", "out = '../plots'").unwrap(),
            "out = './plots'"
        );
    }

    #[test]
    fn test_data_path_print_with_shell_variable() {
        let rules = all_rules();
        let text = "print(f'Data path: $HOME/data')";
        assert_eq!(rules.apply(text), "print(f'Data path: {data_path}')");
    }

    #[test]
    fn test_print_statements() {
        let rules = all_rules();
        assert_eq!(
            rules.apply("print(f\"Working directory: /tmp/x\")"),
            "print(f'Working directory: {Path.cwd()}')"
        );
        assert_eq!(
            rules.apply("print(f'Boxplots saved to: {out}')"),
            "# Path updated to relative"
        );
    }

    #[test]
    fn test_og_data_dir_and_data_dir_argument() {
        let rules = all_rules();
        let text = "OG_DATA_DIR = (notebook_dir / \"..\" / \"..\" / \"Data\").resolve()\n\
                    df = load(data_dir=DATA_DIR)\n";
        assert_eq!(
            rules.apply(text),
            "OG_DATA_DIR = Path('.').resolve()\ndf = load(data_dir = Path('.'))\n"
        );
    }

    #[test]
    fn test_escaped_y_drive_paths() {
        let rules = PathRules::for_set(RuleSet::Comprehensive).unwrap();
        assert_eq!(
            rules.apply(r#"msg = f"{root}Y:\\data\\ecg""#),
            "msg = f'{Path.cwd()}'"
        );
        assert_eq!(rules.apply(r"see Y:\\data\\ecg here"), "see . here");
    }

    #[test]
    fn test_unmatched_text_is_unchanged() {
        let rules = all_rules();
        let text = "import numpy as np\nx = np.arange(10)\n";
        assert_eq!(rules.apply(text), text);
        for rule in rules.iter() {
            assert!(matches!(rule.apply(text), Cow::Borrowed(_)), "{}", rule.name());
        }
    }

    #[test]
    fn test_full_table_is_idempotent() {
        let rules = all_rules();
        let text = "from pathlib import Path\n\
                    notebook_dir = Path.cwd().resolve()\n\
                    DATA_DIR = r'Y:\\Shared\\Data'\n\
                    data_path = (notebook_dir / '..' / 'Data').resolve()\n\
                    ecg_data_path = data_path / 'time-series-project2025'\n\
                    print(f\"Data path: {data_path}\")\n\
                    print(f'Plots path: /Users/anna/plots')\n\
                    df.to_csv('../Data/features.csv')\n\
                    plt.savefig('../plots/fig1.png')\n\
                    print(f'Clustered data saved to: {path}')\n";
        let once = rules.apply(text);
        assert_ne!(once, text);
        assert_eq!(rules.apply(&once), once);
    }

    #[test]
    fn test_unknown_rule_name() {
        let rules = all_rules();
        assert!(matches!(
            rules.apply_rule("no-such-rule", "x"),
            Err(PrepError::UnknownRule(_))
        ));
    }

    #[test]
    fn test_categories_are_exposed() {
        let rules = all_rules();
        let first = rules.iter().next().unwrap();
        assert_eq!(first.category(), RuleCategory::AbsolutePath);
    }
}
