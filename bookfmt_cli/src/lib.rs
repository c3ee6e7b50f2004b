use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Format tutorial markdown and expand its shortcodes.",
	long_about = "bookfmt formats the markdown sources of a tutorial book and builds the published \
	              documents from them.\n\nShortcodes such as `{% include player.gd anchor %}`, \
	              `{% link chapter %}` and `{% contents %}` pull code and cross references into \
	              the document.\n\nQuick start:\n  bookfmt init            Create a bookfmt.toml \
	              file\n  bookfmt format          Format every markdown file in place\n  bookfmt \
	              format --check  Verify everything is formatted\n  bookfmt expand FILE     Print \
	              the built document"
)]
pub struct BookfmtCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Create a sample `bookfmt.toml` in the project root.
	///
	/// If a config file already exists this command leaves it alone and exits
	/// successfully.
	Init,
	/// Format markdown files in place.
	///
	/// Wraps code identifiers, file paths and numbers in code spans,
	/// emphasizes proper nouns, marks up keyboard shortcuts and reflows long
	/// comments in code blocks. Shortcodes are left as they are.
	///
	/// Without FILES every markdown document of the project is formatted.
	Format {
		/// Files to format, relative to the project root.
		files: Vec<PathBuf>,

		/// Report files that would change without writing them. Exits with a
		/// non-zero status code when any file is not formatted.
		#[arg(long, default_value_t = false)]
		check: bool,

		/// Show a unified diff for every file that changes.
		#[arg(long, default_value_t = false)]
		diff: bool,
	},
	/// Expand the shortcodes of a document and print the formatted result.
	///
	/// Shortcodes that fail are left in place and reported. Exits with a
	/// non-zero status code when any shortcode failed with an error.
	Expand {
		/// The document to build, relative to the project root.
		file: PathBuf,

		/// Use `text` to print the document, or `json` for the document
		/// together with its diagnostics.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		output_format: OutputFormat,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	Text,
	Json,
}
