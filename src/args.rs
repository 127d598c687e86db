use clap::Parser;

/// This is a questionnaire editing session driver.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The questionnaire document to edit, in JSON format.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (project id) Start the session from a blank questionnaire in the given project
    /// instead of loading one with --input.
    #[clap(long, value_parser)]
    pub new_project: Option<i64>,

    /// (file path) A JSON array of edit actions, applied in order to the questionnaire.
    #[clap(short, long, value_parser)]
    pub script: Option<String>,

    /// (file path or 'stdout') If specified, the edited questionnaire will be written in JSON
    /// format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference questionnaire in JSON format. If provided, quex will check
    /// that the edited document matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path or directory) If specified, the translatable strings of the questionnaire
    /// are exported as a CSV table to the given location.
    #[clap(long, value_parser)]
    pub export_translations: Option<String>,

    /// (file path, csv or xlsx) If specified, the given translation table is imported into
    /// the questionnaire before the script runs.
    #[clap(long, value_parser)]
    pub import_translations: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
