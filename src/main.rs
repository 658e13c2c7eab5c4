use std::env;
use std::path::PathBuf;
use std::process;

use vamp::output::{AudioOutput, OfflineOutput};
use vamp::render::{render, write_wav};
use vamp::samples::{SampleBank, SampleLoader, SynthLoader, WavDirLoader};
use vamp::{Trainer, TrainerConfig};

/// Offline clock step between polls, in seconds.
const TICK: f64 = 0.05;

/// Output sample rate for `--out`.
const RENDER_RATE: u32 = 44_100;

const USAGE: &str = "Usage: vamp [--config file.yaml] [--chords N] [--out file.wav] [--json]";

struct Args {
    config: Option<PathBuf>,
    chords: usize,
    out: Option<PathBuf>,
    json: bool,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args {
        config: None,
        chords: 4,
        out: None,
        json: false,
    };

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().ok_or("--config needs a file")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--chords" => {
                let n = iter.next().ok_or("--chords needs a number")?;
                parsed.chords = n.parse().map_err(|_| format!("Invalid chord count: {}", n))?;
            }
            "--out" => {
                let path = iter.next().ok_or("--out needs a file")?;
                parsed.out = Some(PathBuf::from(path));
            }
            "--json" => parsed.json = true,
            "-h" | "--help" => return Err(String::new()),
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }
    Ok(parsed)
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(msg) => {
            if !msg.is_empty() {
                eprintln!("{}", msg);
            }
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };

    let config = match &args.config {
        Some(path) => match TrainerConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error reading config '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => TrainerConfig::default(),
    };

    // Recorded samples if the config points at them, synthesized tones otherwise.
    let loader: Box<dyn SampleLoader> = match &config.samples_dir {
        Some(dir) => Box::new(WavDirLoader::new(dir)),
        None => Box::new(SynthLoader::default()),
    };

    let mut trainer = Trainer::new(&config, SampleBank::new(loader), OfflineOutput::new());

    let mut events = match trainer.start_session(config.settings) {
        Ok(events) => events,
        Err(e) => {
            eprintln!("Could not start session: {}", e);
            process::exit(1);
        }
    };

    // Each chord rings for two loop iterations before moving on.
    let hold = 2.0 * config.settings.sanitized().loop_period();
    for n in 0..args.chords {
        if n > 0 {
            events.extend(trainer.next_chord());
        }
        if let Some(label) = trainer.current_label() {
            let hint = trainer.current_scale_hint().unwrap_or("");
            println!("{:<10} {}", label, hint);
        }

        let until = trainer.output().now() + hold;
        while trainer.output().now() + TICK < until {
            trainer.output_mut().advance(TICK);
            events.extend(trainer.poll());
        }
        trainer.output_mut().advance_to(until);
    }
    trainer.stop_session();

    if args.json {
        for event in &events {
            match serde_json::to_string(event) {
                Ok(line) => println!("{}", line),
                Err(e) => {
                    eprintln!("Error encoding event: {}", e);
                    process::exit(1);
                }
            }
        }
    }

    if let Some(path) = &args.out {
        let (provider, output) = trainer.into_parts();
        let audio = render(output.events(), &provider, RENDER_RATE);
        if let Err(e) = write_wav(path, &audio) {
            eprintln!("Error writing to '{}': {}", path.display(), e);
            process::exit(1);
        }
        eprintln!("Wrote {:.1}s of audio to {}", audio.len() as f64 / RENDER_RATE as f64, path.display());
    }
}
