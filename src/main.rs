// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_html_tags)]
#![deny(rustdoc::bare_urls)]

//! A CLI to move files to the trash, restore them, erase them for good, and keep the trash tidy.

use std::process::ExitCode;

/// Run with arguments passed via the CLI.
fn main() -> ExitCode {
    let raw_args = std::env::args_os();
    let raw_vars = std::env::vars_os();

    let vars = cli::parse_vars(raw_vars);
    let args = cli::parse_args(raw_args, vars).unwrap_or_else(|err| err.exit());
    let env = recyclebin::Environment::from_process();

    match cli::run(&args, &env) {
        Ok(()) => ExitCode::SUCCESS,
        Err(()) => ExitCode::FAILURE,
    }
}

/// Programmatic interface for the CLI.
mod cli {
    use super::{lang, logging, trash};

    use std::ffi::{OsStr, OsString};
    use std::path::PathBuf;

    use clap::error::Error;
    use clap::{Parser, Subcommand};
    use log::{error, info, trace};
    use recyclebin::Environment;

    #[cfg(test)]
    use proptest_derive::Arbitrary;

    /// Move files to the trash instead of deleting them - v0.1
    ///
    /// Recycled files can be listed, restored to where they came from, or erased for good. Files
    /// are moved to the trash of the device they are on, or the home trash if that's the same
    /// device as the home directory.
    ///
    /// The home trash is found in $XDG_DATA_HOME/Trash, or $HOME/.local/share/Trash if
    /// $XDG_DATA_HOME is not set.
    #[derive(Parser)]
    #[command(name = "recyclebin", version = None)]
    #[command(about = "Move files to the trash instead of deleting them", long_about)]
    pub struct Args {
        /// Only output errors.
        #[arg(short = 'q', long, group = "verbosity")]
        quiet: bool,

        /// Explain what is being done.
        #[arg(short = 'v', long, group = "verbosity")]
        verbose: bool,

        /// What to do.
        #[command(subcommand)]
        command: Command,
    }

    /// Enum representing the commands of the CLI.
    #[derive(Subcommand)]
    enum Command {
        /// Move the PATH(s) to the trash.
        Recycle {
            /// The paths to recycle.
            #[arg(required = true)]
            paths: Vec<PathBuf>,
        },

        /// Move the trashed NAME(s) back to where they were recycled from.
        Restore {
            /// The names of the items in the trash.
            #[arg(required = true)]
            names: Vec<OsString>,

            #[command(flatten)]
            trash: TrashArgs,
        },

        /// Erase the trashed NAME(s) for good.
        Remove {
            /// The names of the items in the trash.
            #[arg(required = true)]
            names: Vec<OsString>,

            #[command(flatten)]
            trash: TrashArgs,
        },

        /// Erase everything in the trash for good.
        Empty {
            #[command(flatten)]
            trash: TrashArgs,
        },

        /// List the items in the trash.
        List {
            #[command(flatten)]
            trash: TrashArgs,
        },

        /// Find items without a record and records without an item.
        Audit {
            /// Erase whatever is found.
            #[arg(short = 'r', long)]
            repair: bool,

            #[command(flatten)]
            trash: TrashArgs,
        },
    }

    /// Struct representing the arguments that select a trash.
    #[derive(clap::Args)]
    struct TrashArgs {
        /// Use the trash that PATH would be recycled to instead of the home trash.
        #[arg(short = 'l', long, value_name = "PATH")]
        location: Option<PathBuf>,
    }

    /// Tests for the [`Args`] struct.
    #[cfg(test)]
    mod test_args {
        use super::Args;

        use clap::CommandFactory;

        #[test]
        fn clap_verification() {
            Args::command().debug_assert();
        }
    }

    /// The `Result` type for parsing CLI arguments.
    type ParseResult = Result<Args, Error>;

    /// Parse arguments for the CLI.
    ///
    /// # Errors
    ///
    /// If the given arguments couldn't be parsed.
    pub fn parse_args<T>(args: T, vars: Vars) -> ParseResult
    where
        T: IntoIterator,
        T::Item: Into<OsString> + Clone,
    {
        let mut args = Args::try_parse_from(args)?;

        if vars.debug && !args.quiet {
            args.verbose = true;
        }

        Ok(args)
    }


    /// A standard environment variable name to enable verbose mode.
    const DEBUG_MODE: &str = "DEBUG";

    /// Struct representing parsed environment configuration values.
    #[cfg_attr(test, derive(Arbitrary, Clone, Copy, Debug))]
    pub struct Vars {
        /// The environment configuration value for debug mode.
        debug: bool,
    }

    /// Parse environment variables for the CLI.
    pub fn parse_vars<T, K, V>(vars: T) -> Vars
    where
        T: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
    {
        Vars { debug: vars.into_iter().any(|(name, _)| name.as_ref() == DEBUG_MODE) }
    }

    /// Tests for the [`parse_vars`] function.
    #[cfg(test)]
    mod test_parse_vars {
        use super::test_helpers::{TestVars, TestVarsAndIndex};

        use super::parse_vars;

        use proptest::prelude::*;
        use proptest_attr_macro::proptest;

        #[proptest]
        fn debug_not_set(vars: TestVars) {
            prop_assume!(!vars.contains_key(super::DEBUG_MODE));

            let out = parse_vars(vars.inner());
            prop_assert!(!out.debug);
        }

        #[proptest]
        fn debug_set(vars: TestVarsAndIndex, val: String) {
            let out = parse_vars(vars.insert((super::DEBUG_MODE, &val)));
            prop_assert!(out.debug);
        }
    }

    /// Run the CLI with the given (parsed) arguments in the given environment.
    ///
    /// See also [`parse_args`].
    ///
    /// # Errors
    ///
    /// If there is a CLI runtime error.
    pub fn run(args: &Args, env: &Environment) -> Result<(), ()> {
        logging::configure(&if args.quiet {
            logging::Verbosity::Quiet
        } else if args.verbose {
            logging::Verbosity::Verbose
        } else {
            logging::Verbosity::Normal
        });

        trace!("start processing");
        match &args.command {
            Command::Recycle { paths } => {
                conclude(paths.iter().map(|path| trash::recycle(env, path)), "recycled")
            },
            Command::Restore { names, trash: selected } => {
                let bin = open(env, selected)?;
                conclude(names.iter().map(|name| trash::restore(&bin, name)), "restored")
            },
            Command::Remove { names, trash: selected } => {
                let bin = open(env, selected)?;
                conclude(names.iter().map(|name| trash::remove(&bin, name)), "removed")
            },
            Command::Empty { trash: selected } => {
                let bin = open(env, selected)?;
                report(trash::empty(&bin))
            },
            Command::List { trash: selected } => {
                let bin = open(env, selected)?;
                list(&bin)
            },
            Command::Audit { repair, trash: selected } => {
                let bin = open(env, selected)?;
                audit(&bin, *repair)
            },
        }
    }

    /// Open the trash selected by `args`, reporting any error.
    fn open(env: &Environment, args: &TrashArgs) -> Result<trash::Trash, ()> {
        trash::open(env, args.location.as_deref()).map_err(|err| {
            error!("Cannot use the trash: {err}");
        })
    }

    /// Report the outcome of processing every item and conclude with a summary.
    fn conclude<I>(results: I, verb: &str) -> Result<(), ()>
    where
        I: Iterator<Item = trash::Result>,
    {
        let (done, errored): (usize, usize) = results
            .inspect(|result| match result {
                Ok(msg) => info!("{msg}"),
                Err(msg) => error!("{msg}"),
            })
            .fold((0, 0), |(oks, errs), result| match result {
                Ok(_) => (oks.saturating_add(1), errs),
                Err(_) => (oks, errs.saturating_add(1)),
            });

        info!("\n{done} {verb}, {} occurred", lang::pluralize("error", errored));

        if errored > 0 { Err(()) } else { Ok(()) }
    }

    /// Report the outcome of a single operation.
    fn report(result: trash::Result) -> Result<(), ()> {
        match result {
            Ok(msg) => {
                info!("{msg}");
                Ok(())
            },
            Err(msg) => {
                error!("{msg}");
                Err(())
            },
        }
    }

    /// List the items in the trash.
    fn list(bin: &trash::Trash) -> Result<(), ()> {
        let lines = trash::list(bin).map_err(|err| error!("Cannot list the trash: {err}"))?;
        if lines.is_empty() {
            info!("The trash is empty");
        }

        for line in lines {
            info!("{line}");
        }

        Ok(())
    }

    /// Report, and if `repair` is set erase, the leftovers in the trash.
    fn audit(bin: &trash::Trash, repair: bool) -> Result<(), ()> {
        let results =
            trash::audit(bin, repair).map_err(|err| error!("Cannot audit the trash: {err}"))?;

        let count = results.len();
        let mut failed = false;
        for result in results {
            match result {
                Ok(msg) => info!("{msg}"),
                Err(msg) => {
                    failed = true;
                    error!("{msg}");
                },
            }
        }

        info!("\n{} found", lang::pluralize("leftover", count));

        if failed { Err(()) } else { Ok(()) }
    }

}

/// Trash operations as performed by the CLI.
///
/// Every operation produces the message to show to the user, whether it succeeded or not.
#[cfg(all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android"))))]
mod trash {
    use std::ffi::OsStr;
    use std::path::Path;

    use log::{trace, warn};
    use owo_colors::OwoColorize;
    use recyclebin::posix::{Orphan, PosixTrash};
    use recyclebin::{Environment, Error, OsStore, RecycleBin};

    /// The trash the CLI operates on.
    pub type Trash = PosixTrash<OsStore>;

    /// The `Result` type for a trash operation, holding the message to show either way.
    pub type Result = std::result::Result<String, String>;

    /// The format used to show deletion dates.
    const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    /// Open the home trash, or the trash `location` would be recycled to.
    ///
    /// # Errors
    ///
    /// If the trash can't be found or created.
    pub fn open(env: &Environment, location: Option<&Path>) -> recyclebin::Result<Trash> {
        match location {
            Some(path) => {
                let path = std::path::absolute(path).map_err(|err| Error::io(path, &err))?;
                PosixTrash::for_location(OsStore, env, &path)
            },
            None => PosixTrash::home(OsStore, env),
        }
    }

    /// Move the entry at `path` to its trash and record its size if it's a directory.
    ///
    /// # Errors
    ///
    /// If the entry can't be moved to the trash.
    pub fn recycle(env: &Environment, path: &Path) -> Result {
        let absolute = std::path::absolute(path).map_err(|err| {
            format!("Cannot recycle {}: {}", path.display(), reason(&Error::io(path, &err), path))
        })?;
        let fail = |err: Error| {
            format!("Cannot recycle {}: {}", path.display(), reason(&err, &absolute))
        };
        let bin = PosixTrash::for_location(OsStore, env, &absolute).map_err(fail)?;
        let name = bin.recycle(&absolute).map_err(fail)?;

        match bin.track_directory(&name) {
            Ok(Some(entry)) => {
                trace!("recorded the size of {} as {}", name.display(), entry.size());
            },
            Ok(None) => {},
            Err(err) => warn!("Cannot record the size of {}: {err}", name.display()),
        }

        Ok(format!("Moved {} to trash as {}", path.display().bold(), name.display().bold()))
    }

    /// Move the trashed item `name` back to where it was recycled from.
    ///
    /// # Errors
    ///
    /// If the item is unknown or can't be moved back.
    pub fn restore(bin: &Trash, name: &OsStr) -> Result {
        let fail = |err: Error| format!("Cannot restore {}: {err}", name.display());

        let record = bin.info(name).map_err(fail)?;
        bin.restore(name).map_err(fail)?;
        untrack(bin, record.path());

        Ok(format!("Restored {} to {}", name.display().bold(), record.path().display().bold()))
    }

    /// Erase the trashed item `name` and drop its size from the cache.
    ///
    /// # Errors
    ///
    /// If the item or its record can't be removed.
    pub fn remove(bin: &Trash, name: &OsStr) -> Result {
        let record = bin.info(name);
        bin.remove(name).map_err(|err| format!("Cannot remove {}: {err}", name.display()))?;
        match record {
            Ok(record) => untrack(bin, record.path()),
            Err(err) => trace!("not dropping the size of {}: {err}", name.display()),
        }

        Ok(format!("Removed {}", name.display().bold()))
    }

    /// Erase everything in the trash, including the size cache.
    ///
    /// # Errors
    ///
    /// If the trash can't be emptied.
    pub fn empty(bin: &Trash) -> Result {
        let root = bin.location().root();
        let fail = |err: Error| format!("Cannot empty {}: {err}", root.display());

        bin.empty().map_err(fail)?;
        bin.clear_directory_sizes().map_err(fail)?;

        Ok(format!("Emptied {}", root.display().bold()))
    }

    /// Describe every item in the trash, one line per item.
    ///
    /// # Errors
    ///
    /// If the trash can't be listed.
    pub fn list(bin: &Trash) -> recyclebin::Result<Vec<String>> {
        let items = bin.list()?;
        Ok(items
            .iter()
            .map(|item| {
                format!(
                    "{}  {}  {}",
                    item.deletion_date().format(DATE_FORMAT),
                    item.name().display().bold(),
                    item.original_path().display(),
                )
            })
            .collect())
    }

    /// Find, and if `repair` is set erase, every item without a record and every record without
    /// an item.
    ///
    /// Leftovers that are found but not erased are reported as errors.
    ///
    /// # Errors
    ///
    /// If the trash can't be read.
    pub fn audit(bin: &Trash, repair: bool) -> recyclebin::Result<Vec<Result>> {
        let orphans = bin.orphans()?;
        Ok(orphans
            .into_iter()
            .map(|orphan| {
                let description = match &orphan {
                    Orphan::Body(name) => format!("item {} without a record", name.display()),
                    Orphan::Record(name) => format!("record {} without an item", name.display()),
                };

                if !repair {
                    return Err(format!("Found {description} (use '--repair' to erase)"));
                }

                match bin.repair(&orphan) {
                    Ok(()) => Ok(format!("Erased {description}")),
                    Err(err) => Err(format!("Cannot erase {description}: {err}")),
                }
            })
            .collect())
    }

    /// Describe `err`, leaving out its path if that's `subject`.
    fn reason(err: &Error, subject: &Path) -> String {
        if err.path() != subject {
            return err.to_string();
        }

        match err.tip() {
            Some(tip) => format!("{} ({tip})", err.kind()),
            None => err.kind().to_string(),
        }
    }

    /// Drop the size of the directory recycled from `original_path` from the cache.
    fn untrack(bin: &Trash, original_path: &Path) {
        if let Err(err) = bin.untrack(original_path) {
            warn!("Cannot drop the size of {}: {err}", original_path.display());
        }
    }



}

/// Trash operations as performed by the CLI, through the operating system's trash.
///
/// Every operation produces the message to show to the user, whether it succeeded or not.
#[cfg(not(all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android")))))]
mod trash {
    use std::ffi::OsStr;
    use std::path::Path;

    use owo_colors::OwoColorize;
    use recyclebin::{Environment, Error, ErrorKind, RecycleBin};

    /// The trash the CLI operates on.
    pub type Trash = Box<dyn RecycleBin>;

    /// The `Result` type for a trash operation, holding the message to show either way.
    pub type Result = std::result::Result<String, String>;

    /// Open the trash of this platform.
    ///
    /// # Errors
    ///
    /// If this platform has no trash.
    pub fn open(_env: &Environment, location: Option<&Path>) -> recyclebin::Result<Trash> {
        recyclebin::system_trash(location.unwrap_or(Path::new(".")))
    }

    /// Move the entry at `path` to the trash.
    ///
    /// # Errors
    ///
    /// If the entry can't be moved to the trash.
    pub fn recycle(_env: &Environment, path: &Path) -> Result {
        let fail = |err: Error| format!("Cannot recycle {}: {err}", path.display());

        let name = recyclebin::system_trash(path).and_then(|bin| bin.recycle(path)).map_err(fail)?;
        Ok(format!("Moved {} to trash as {}", path.display().bold(), name.display().bold()))
    }

    /// Move the trashed item `name` back to where it was recycled from.
    ///
    /// # Errors
    ///
    /// If the item is unknown or can't be moved back.
    pub fn restore(bin: &Trash, name: &OsStr) -> Result {
        bin.restore(name).map_err(|err| format!("Cannot restore {}: {err}", name.display()))?;
        Ok(format!("Restored {}", name.display().bold()))
    }

    /// Erase the trashed item `name`.
    ///
    /// # Errors
    ///
    /// If the item can't be removed.
    pub fn remove(bin: &Trash, name: &OsStr) -> Result {
        bin.remove(name).map_err(|err| format!("Cannot remove {}: {err}", name.display()))?;
        Ok(format!("Removed {}", name.display().bold()))
    }

    /// Erase everything in the trash.
    ///
    /// # Errors
    ///
    /// If the trash can't be emptied.
    pub fn empty(bin: &Trash) -> Result {
        bin.empty().map_err(|err| format!("Cannot empty the trash: {err}"))?;
        Ok("Emptied the trash".to_owned())
    }

    /// Listing is not supported through the operating system's trash.
    ///
    /// # Errors
    ///
    /// Always.
    pub fn list(_bin: &Trash) -> recyclebin::Result<Vec<String>> {
        Err(Error::new("trash", ErrorKind::Unsupported))
    }

    /// Auditing is not supported through the operating system's trash.
    ///
    /// # Errors
    ///
    /// Always.
    pub fn audit(_bin: &Trash, _repair: bool) -> recyclebin::Result<Vec<Result>> {
        Err(Error::new("trash", ErrorKind::Unsupported))
    }
}

/// Language tasks utilities.
mod lang {
    /// Pluralize a noun based on the number of associated items. The count is always included in
    /// the return value.
    pub fn pluralize(noun: &str, count: usize) -> String {
        if count == 1 { format!("{count} {noun}") } else { format!("{count} {noun}s") }
    }

    /// Tests for the [`pluralize`] function.
    #[cfg(test)]
    mod test_pluralize {
        use super::pluralize;

        use proptest::prelude::*;
        use proptest_attr_macro::proptest;

        #[proptest]
        fn zero(noun: String) {
            prop_assert_eq!(pluralize(&noun, 0), format!("0 {noun}s"));
        }

        #[proptest]
        fn one(noun: String) {
            prop_assert_eq!(pluralize(&noun, 1), format!("1 {noun}"));
        }

        #[proptest]
        fn many(noun: String, count: usize) {
            prop_assume!(count > 1);
            prop_assert_eq!(pluralize(&noun, count), format!("{count} {noun}s"));
        }
    }
}

/// Logging utilities.
///
/// Logging functionality is provided by the [`log`] crate. The CLI and the library use:
/// - [`log::error!`] and [`log::warn!`], for outputting problems.
/// - [`log::info!`], for normal messaging (shown unless `--quiet`).
/// - [`log::debug!`] and [`log::trace!`], to explain what is being done (shown if `--verbose`).
///
/// # Example
///
/// ```no_run
/// logging::configure(&logging::Verbosity::Normal);
/// log::error!("logged");
/// log::info!("logged");
/// log::trace!("not logged");
/// ```
mod logging {
    /// Enum representing the available levels of output verbosity.
    pub enum Verbosity {
        /// The normal verbosity of the CLI: output info, warning, and error messages.
        Normal,

        /// The `--quiet` mode of the CLI: output warning and error messages only.
        Quiet,

        /// The `--verbose` mode of the CLI: output everything.
        Verbose,
    }

    /// Set the [`Verbosity`] of the logging output.
    pub fn configure(verbosity: &Verbosity) {
        match *verbosity {
            Verbosity::Normal => log::set_max_level(log::LevelFilter::Info),
            Verbosity::Quiet => log::set_max_level(log::LevelFilter::Warn),
            Verbosity::Verbose => log::set_max_level(log::LevelFilter::Trace),
        }

        _ = log::set_logger(&Logger);
    }

    /// Struct to implement the [`log::Log`] trait.
    struct Logger;

    impl log::Log for Logger {
        #[cfg(not(tarpaulin_include))]
        fn enabled(&self, _: &log::Metadata<'_>) -> bool {
            true // don't need to filter after using `set_max_level`
        }

        #[cfg(not(tarpaulin_include))]
        fn flush(&self) {
            // don't need to flush with `(e)println!`
        }

        fn log(&self, record: &log::Record<'_>) {
            use anstream::{eprintln, println};
            use owo_colors::OwoColorize;

            match record.level() {
                log::Level::Error => eprintln!("{}", record.args()),
                log::Level::Warn => eprintln!("{}", format!("Warning: {}", record.args()).yellow()),
                log::Level::Info => println!("{}", record.args()),
                log::Level::Debug | log::Level::Trace => {
                    println!("{}", format!("[{}]", record.args()).italic());
                },
            }
        }
    }
}
