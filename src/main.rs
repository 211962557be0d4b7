use std::{
    error::Error,
    path::{Path, PathBuf},
};

use clap::{Parser, ValueEnum};
use flexi_logger::Logger;
use tz_mcts::{
    Backend, EngineConfig, GameRecord, GameState, MoveVocabulary, OnnxEvaluator,
    UniformEvaluator, ValueBackup, play_game,
};

#[derive(Parser, Debug)]
#[command(name = "tz-mcts", about = "Play chess with PUCT search over an ONNX policy/value network")]
struct Cli {
    /// Starting position; the standard start position when omitted
    #[arg(long)]
    fen: Option<String>,

    /// JSON config file. Flags below override its values.
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// ONNX model path
    #[arg(short = 'm', long)]
    model: Option<PathBuf>,

    /// Download the model from here if it does not exist yet
    #[arg(long)]
    model_url: Option<String>,

    /// Move vocabulary file (one UCI move per line, or a JSON map)
    #[arg(long)]
    vocabulary: Option<PathBuf>,

    /// Simulations per ply
    #[arg(short = 's', long)]
    simulations: Option<u32>,

    #[arg(long)]
    c_puct: Option<f32>,

    /// First-play urgency
    #[arg(long, allow_negative_numbers = true)]
    fpu: Option<f32>,

    /// Stop after this many plies
    #[arg(short = 'n', long)]
    max_plies: Option<u32>,

    #[arg(long, value_enum)]
    backup: Option<BackupArg>,

    #[arg(long, value_enum)]
    backend: Option<BackendArg>,

    /// Search with flat priors and neutral values instead of a model
    #[arg(long, default_value_t = false)]
    uniform: bool,

    /// Write the game record as JSON
    #[arg(long)]
    record: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackupArg {
    Negamax,
    SameSign,
}

impl From<BackupArg> for ValueBackup {
    fn from(arg: BackupArg) -> Self {
        match arg {
            BackupArg::Negamax => ValueBackup::Negamax,
            BackupArg::SameSign => ValueBackup::SameSign,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    Tract,
    Candle,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Tract => Backend::Tract,
            BackendArg::Candle => Backend::Candle,
        }
    }
}

impl Cli {
    fn engine_config(&self) -> Result<EngineConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_file(path)?,
            None => EngineConfig::default(),
        };

        let search = &mut config.game.search;
        if let Some(n) = self.simulations {
            search.simulations = n;
        }
        if let Some(c) = self.c_puct {
            search.c_puct = c;
        }
        if let Some(fpu) = self.fpu {
            search.fpu = fpu;
        }
        if let Some(backup) = self.backup {
            search.backup = backup.into();
        }
        if self.max_plies.is_some() {
            config.game.max_plies = self.max_plies;
        }

        let model = &mut config.model;
        if let Some(path) = &self.model {
            model.path = path.clone();
        }
        if self.model_url.is_some() {
            model.url = self.model_url.clone();
        }
        if let Some(backend) = self.backend {
            model.backend = backend.into();
        }
        if self.vocabulary.is_some() {
            model.vocabulary = self.vocabulary.clone();
        }
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    Logger::try_with_env_or_str("info")?
        .format(flexi_logger::colored_default_format)
        .start()?;

    let config = cli.engine_config()?;
    log::debug!("{config:?}");

    let vocabulary = match &config.model.vocabulary {
        Some(path) => MoveVocabulary::from_file(path)?,
        None => MoveVocabulary::standard(),
    };
    let mut state = match &cli.fen {
        Some(fen) => GameState::from_fen(fen)?,
        None => GameState::default(),
    };

    let record = if cli.uniform {
        let mut evaluator = UniformEvaluator::new(vocabulary.len());
        play_game(&mut state, &mut evaluator, &vocabulary, &config.game)?
    } else {
        let mut evaluator = OnnxEvaluator::from_config(&config.model)?;
        play_game(&mut state, &mut evaluator, &vocabulary, &config.game)?
    };

    print_record(&record);
    if let Some(path) = &cli.record {
        write_record(&record, path)?;
    }
    Ok(())
}

fn print_record(record: &GameRecord) {
    println!("Start: {}", record.start_fen);
    let moves: Vec<String> = record.moves().map(|m| m.to_string()).collect();
    println!("Moves: {}", moves.join(" "));
    println!("Final: {}", record.final_fen);
    match record.result {
        Some(result) => println!("Result: {result:?}"),
        None => println!("Result: unfinished"),
    }
}

#[cfg(feature = "serde")]
fn write_record(record: &GameRecord, path: &Path) -> Result<(), Box<dyn Error>> {
    std::fs::write(path, serde_json::to_string_pretty(record)?)?;
    log::info!("wrote game record to {}", path.display());
    Ok(())
}

#[cfg(not(feature = "serde"))]
fn write_record(_record: &GameRecord, path: &Path) -> Result<(), Box<dyn Error>> {
    Err(format!("cannot write {}: built without the serde feature", path.display()).into())
}
