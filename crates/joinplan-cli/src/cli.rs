use std::path::PathBuf;

pub const DEFAULT_CONFIG: &str = "joinplan.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Init,
    Plan,
    Fields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    pub verbosity: Verbosity,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help(HelpTopic),
    Init(InitArgs),
    Plan(PlanArgs),
    Fields(FieldsArgs),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitArgs {
    pub config: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanArgs {
    pub config: PathBuf,
    pub depth: Option<i64>,
    pub tables: Vec<String>,
    pub dry_run: bool,
    pub check: bool,
    /// Schema files, directories or glob patterns. Replace `[schema].documents` when given.
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldsArgs {
    pub config: PathBuf,
    pub depth: Option<i64>,
    pub table: String,
    pub files: Vec<PathBuf>,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Cli> {
    let mut verbosity = Verbosity::Normal;
    let mut rest: Vec<&str> = Vec::with_capacity(args.len());
    for token in args.iter().skip(1) {
        match token.as_str() {
            "-v" | "--verbose" => verbosity = Verbosity::Verbose,
            "-q" | "--quiet" => verbosity = Verbosity::Quiet,
            other => rest.push(other),
        }
    }

    let mut it = rest.into_iter();
    let command = match it.next() {
        None | Some("-h" | "--help" | "help") => Command::Help(HelpTopic::Root),
        Some("init") => parse_init(it)?,
        Some("plan") => parse_plan(it)?,
        Some("fields") => parse_fields(it)?,
        Some(other) => anyhow::bail!("unknown command: {other}"),
    };

    Ok(Cli { verbosity, command })
}

/// Options shared by every subcommand that reads schemas.
#[derive(Debug)]
struct Common {
    config: PathBuf,
    depth: Option<i64>,
}

impl Default for Common {
    fn default() -> Self {
        Self {
            config: PathBuf::from(DEFAULT_CONFIG),
            depth: None,
        }
    }
}

impl Common {
    /// Consume `token` (and its value) if it is a shared option.
    fn accept<'a>(
        &mut self,
        token: &'a str,
        it: &mut impl Iterator<Item = &'a str>,
    ) -> anyhow::Result<bool> {
        if let Some(v) = option_value(token, "--config", it)? {
            self.config = PathBuf::from(v);
            return Ok(true);
        }
        if let Some(v) = option_value(token, "--depth", it)?.or(option_value(token, "-d", it)?) {
            let depth = v
                .parse::<i64>()
                .map_err(|_| anyhow::anyhow!("--depth expects an integer (got {v})"))?;
            self.depth = Some(depth);
            return Ok(true);
        }
        Ok(false)
    }
}

/// `--name value` or `--name=value`.
fn option_value<'a>(
    token: &'a str,
    name: &str,
    it: &mut impl Iterator<Item = &'a str>,
) -> anyhow::Result<Option<&'a str>> {
    if token == name {
        let Some(v) = it.next() else {
            anyhow::bail!("{name} requires a value");
        };
        return Ok(Some(v));
    }
    Ok(token
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix('=')))
}

fn parse_init<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Init)),
            _ => match option_value(token, "--config", &mut it)? {
                Some(v) => config = PathBuf::from(v),
                None => anyhow::bail!("unknown argument: {token}"),
            },
        }
    }
    Ok(Command::Init(InitArgs { config }))
}

fn parse_plan<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut common = Common::default();
    let mut tables = Vec::new();
    let mut dry_run = false;
    let mut check = false;
    let mut files = Vec::new();

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Plan)),
            "--dry-run" => dry_run = true,
            "--check" => check = true,
            _ if common.accept(token, &mut it)? => {}
            _ => {
                if let Some(v) = option_value(token, "--table", &mut it)? {
                    tables.extend(split_csv(v));
                } else if token.starts_with('-') {
                    anyhow::bail!("unknown argument: {token}");
                } else {
                    files.push(PathBuf::from(token));
                }
            }
        }
    }

    if dry_run && check {
        anyhow::bail!("--dry-run and --check cannot be combined");
    }

    Ok(Command::Plan(PlanArgs {
        config: common.config,
        depth: common.depth,
        tables,
        dry_run,
        check,
        files,
    }))
}

fn parse_fields<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut common = Common::default();
    let mut positional: Vec<&str> = Vec::new();

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Fields)),
            _ if common.accept(token, &mut it)? => {}
            _ if token.starts_with('-') => anyhow::bail!("unknown argument: {token}"),
            _ => positional.push(token),
        }
    }

    let mut positional = positional.into_iter();
    let Some(table) = positional.next() else {
        anyhow::bail!("fields requires a TABLE argument");
    };

    Ok(Command::Fields(FieldsArgs {
        config: common.config,
        depth: common.depth,
        table: table.to_string(),
        files: positional.map(PathBuf::from).collect(),
    }))
}

fn split_csv(v: &str) -> Vec<String> {
    v.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

pub fn print_help(topic: HelpTopic) {
    let text = match topic {
        HelpTopic::Root => ROOT_HELP,
        HelpTopic::Init => INIT_HELP,
        HelpTopic::Plan => PLAN_HELP,
        HelpTopic::Fields => FIELDS_HELP,
    };
    println!("{}", text.trim_start_matches('\n'));
}

const ROOT_HELP: &str = r#"
joinplan - resolve table schemas into nested fields, joins and projections

USAGE:
  joinplan [-v|-q] <COMMAND> [OPTIONS]

COMMANDS:
  init      Write a joinplan.toml template
  plan      Resolve tables and write one JSON plan per table
  fields    Print the nested fields of one table

GLOBAL OPTIONS:
  -v, --verbose   Log resolution details (RUST_LOG overrides)
  -q, --quiet     Only log errors
  -h, --help      Print help
"#;

const INIT_HELP: &str = r#"
joinplan init - write a joinplan.toml template

USAGE:
  joinplan init [--config PATH]
"#;

const PLAN_HELP: &str = r#"
joinplan plan - resolve tables and write one JSON plan per table

USAGE:
  joinplan plan [--config PATH] [--depth N] [--table NAME]... [--dry-run | --check] [FILES...]

OPTIONS:
  --config PATH   Config file (default: joinplan.toml)
  -d, --depth N   Maximum join depth (values below 1 are clamped to 1)
  --table NAME    Only plan these tables (repeatable, comma separated)
  --dry-run       List plan files that would change
  --check         Fail if plan files are out of date

FILES are YAML schema files, directories (scanned for *.yaml / *.yml) or glob patterns.
Without a config file, FILES are required and plans are printed to stdout.
"#;

const FIELDS_HELP: &str = r#"
joinplan fields - print the nested fields of one table

USAGE:
  joinplan fields [--config PATH] [--depth N] TABLE [FILES...]
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        std::iter::once("joinplan")
            .chain(v.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn no_arguments_prints_help() {
        let cli = parse_args(&args(&[])).unwrap();
        assert_eq!(cli.command, Command::Help(HelpTopic::Root));
    }

    #[test]
    fn parses_plan_options() {
        let cli = parse_args(&args(&[
            "plan",
            "--config=cfg/joinplan.toml",
            "--depth",
            "2",
            "--table",
            "users,posts",
            "--table=orders",
            "-v",
            "--check",
            "schema/",
        ]))
        .unwrap();
        assert_eq!(cli.verbosity, Verbosity::Verbose);
        let Command::Plan(plan) = cli.command else {
            panic!("expected plan command");
        };
        assert_eq!(plan.config, PathBuf::from("cfg/joinplan.toml"));
        assert_eq!(plan.depth, Some(2));
        assert_eq!(plan.tables, vec!["users", "posts", "orders"]);
        assert!(plan.check);
        assert!(!plan.dry_run);
        assert_eq!(plan.files, vec![PathBuf::from("schema/")]);
    }

    #[test]
    fn negative_depth_is_accepted_for_clamping() {
        let cli = parse_args(&args(&["plan", "-d", "-1", "a.yaml"])).unwrap();
        let Command::Plan(plan) = cli.command else {
            panic!("expected plan command");
        };
        assert_eq!(plan.depth, Some(-1));
    }

    #[test]
    fn parses_fields_command() {
        let cli = parse_args(&args(&["-q", "fields", "posts", "a.yaml", "b.yaml"])).unwrap();
        assert_eq!(cli.verbosity, Verbosity::Quiet);
        assert_eq!(
            cli.command,
            Command::Fields(FieldsArgs {
                config: PathBuf::from(DEFAULT_CONFIG),
                depth: None,
                table: "posts".to_string(),
                files: vec![PathBuf::from("a.yaml"), PathBuf::from("b.yaml")],
            })
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_args(&args(&["frobnicate"])).is_err());
        assert!(parse_args(&args(&["plan", "--depth"])).is_err());
        assert!(parse_args(&args(&["plan", "--depth", "deep"])).is_err());
        assert!(parse_args(&args(&["plan", "--dry-run", "--check"])).is_err());
        assert!(parse_args(&args(&["plan", "--bogus"])).is_err());
        assert!(parse_args(&args(&["fields"])).is_err());
    }

    #[test]
    fn subcommand_help() {
        let cli = parse_args(&args(&["plan", "--help"])).unwrap();
        assert_eq!(cli.command, Command::Help(HelpTopic::Plan));
    }
}
