//! Batches and suites: writing case inputs to disk and running the reference solution.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, info};
use rand::random;

use crate::case::Case;
use crate::config::SuiteConfig;
use crate::error::{GenError, GenResult};
use crate::line::Line;
use crate::rng::derive_seed;

/// A numbered group of cases written to one directory
#[derive(Debug, Clone)]
pub struct Batch {
    number: u32,
    start: usize,
    cases: Vec<Case>,
}

impl Batch {
    /// Create a batch whose first case is numbered `start`
    pub fn new(number: u32, start: usize, cases: Vec<Case>) -> Self {
        Self {
            number,
            start,
            cases,
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Number of the first case
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    pub fn cases_mut(&mut self) -> &mut [Case] {
        &mut self.cases
    }

    /// `<cases_dir>/<batch_prefix><number>`
    pub fn location(&self, config: &SuiteConfig) -> PathBuf {
        config
            .cases_dir
            .join(format!("{}{}", config.batch_prefix, self.number))
    }

    /// Generate every case, write `<case>.in` and, with a solution configured, `<case>.out`.
    ///
    /// Returns the paths of the written input files.
    pub fn run(&mut self, config: &SuiteConfig) -> GenResult<Vec<PathBuf>> {
        let location = self.location(config);
        fs::create_dir_all(&location).map_err(|e| GenError::io(&location, e))?;
        info!(
            "writing batch {} ({} cases) to {}",
            self.number,
            self.cases.len(),
            location.display()
        );

        let mut written = Vec::with_capacity(self.cases.len());
        for (offset, case) in self.cases.iter_mut().enumerate() {
            let case_number = self.start + offset;
            let seed = match config.seed {
                Some(base) => derive_seed(base, self.number, case_number),
                None => random(),
            };
            debug!("case {} of batch {} uses seed {}", case_number, self.number, seed);

            let lines = case.generate_input(self.number, seed)?;
            let input = location.join(format!("{}.in", case_number));
            write_lines(&input, &lines)?;
            info!("wrote {}", input.display());

            if let Some(command) = &config.solution {
                let output = location.join(format!("{}.out", case_number));
                run_solution(command, &input, &output)?;
                info!("wrote {}", output.display());
            }
            written.push(input);
        }
        Ok(written)
    }
}

fn write_lines(path: &Path, lines: &[Line]) -> GenResult<()> {
    let file = File::create(path).map_err(|e| GenError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{}", line).map_err(|e| GenError::io(path, e))?;
    }
    writer.flush().map_err(|e| GenError::io(path, e))
}

/// Run `command` through `sh -c` with `input` on stdin and `output` as stdout
fn run_solution(command: &str, input: &Path, output: &Path) -> GenResult<()> {
    let stdin = File::open(input).map_err(|e| GenError::io(input, e))?;
    let stdout = File::create(output).map_err(|e| GenError::io(output, e))?;

    let status = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::from(stdin))
        .stdout(Stdio::from(stdout))
        .status()
        .map_err(|e| GenError::Io {
            path: None,
            message: format!("failed to start `{}`: {}", command, e),
        })?;

    if !status.success() {
        return Err(GenError::SolutionFailed {
            command: command.to_string(),
            status: status.to_string(),
        });
    }
    Ok(())
}

/// Every batch of a test-data set plus where and how to write it
#[derive(Debug, Clone)]
pub struct Suite {
    batches: Vec<Batch>,
    config: SuiteConfig,
}

impl Suite {
    pub fn new(batches: Vec<Batch>, config: SuiteConfig) -> Self {
        Self { batches, config }
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Validate the configuration and run every batch in order
    pub fn run(&mut self) -> GenResult<Vec<PathBuf>> {
        self.config.validate()?;
        let mut written = Vec::new();
        for batch in &mut self.batches {
            written.extend(batch.run(&self.config)?);
        }
        info!(
            "suite finished: {} batches, {} cases",
            self.batches.len(),
            written.len()
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{CaseDefinition, ConstraintSet};
    use crate::config::ConfigError;
    use crate::constraint::BoundedConstraint;
    use tempfile::TempDir;

    fn definition() -> CaseDefinition {
        CaseDefinition::new(
            |constraints: &mut ConstraintSet| {
                constraints.insert("N", BoundedConstraint::new(1i64, 10));
                Ok(())
            },
            |ctx| Ok(vec![Line::scalar(ctx.next_value("N")?), Line::from("end")]),
        )
    }

    fn batch(number: u32, start: usize, count: usize) -> Batch {
        let definition = definition();
        let cases = (0..count)
            .map(|_| definition.default_case().unwrap())
            .collect();
        Batch::new(number, start, cases)
    }

    #[test]
    fn test_location() {
        let config = SuiteConfig::default()
            .with_cases_dir("/tmp/data")
            .with_batch_prefix("group");
        assert_eq!(batch(4, 0, 0).location(&config), PathBuf::from("/tmp/data/group4"));
    }

    #[test]
    fn test_run_writes_numbered_inputs() {
        let dir = TempDir::new().unwrap();
        let config = SuiteConfig::default()
            .with_cases_dir(dir.path())
            .with_seed(11);
        let mut b = batch(2, 5, 3);
        let written = b.run(&config).unwrap();
        assert_eq!(written.len(), 3);

        for case in 5..8 {
            let path = dir.path().join("batch2").join(format!("{}.in", case));
            let content = fs::read_to_string(&path).unwrap();
            let lines: Vec<&str> = content.lines().collect();
            assert_eq!(lines.len(), 2);
            let n: i64 = lines[0].parse().unwrap();
            assert!((1..=10).contains(&n));
            assert_eq!(lines[1], "end");
            assert!(content.ends_with('\n'));
        }
        assert!(!dir.path().join("batch2").join("5.out").exists());
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        for dir in [&first, &second] {
            let config = SuiteConfig::default()
                .with_cases_dir(dir.path())
                .with_seed(3);
            batch(1, 0, 4).run(&config).unwrap();
        }
        for case in 0..4 {
            let name = format!("batch1/{}.in", case);
            assert_eq!(
                fs::read_to_string(first.path().join(&name)).unwrap(),
                fs::read_to_string(second.path().join(&name)).unwrap()
            );
        }
    }

    #[test]
    fn test_solution_output_and_failure() {
        let dir = TempDir::new().unwrap();
        let config = SuiteConfig::default()
            .with_cases_dir(dir.path())
            .with_solution("head -n 1");
        batch(1, 0, 1).run(&config).unwrap();
        let input = fs::read_to_string(dir.path().join("batch1/0.in")).unwrap();
        let output = fs::read_to_string(dir.path().join("batch1/0.out")).unwrap();
        assert_eq!(output, format!("{}\n", input.lines().next().unwrap()));

        let failing = SuiteConfig::default()
            .with_cases_dir(dir.path())
            .with_solution("exit 3");
        let err = batch(2, 0, 1).run(&failing).unwrap_err();
        assert!(matches!(err, GenError::SolutionFailed { .. }));
    }

    #[test]
    fn test_suite_validates_config() {
        let config = SuiteConfig::default().with_batch_prefix("");
        let mut suite = Suite::new(vec![batch(1, 0, 1)], config);
        assert_eq!(
            suite.run().unwrap_err(),
            GenError::Config(ConfigError::EmptyBatchPrefix)
        );
    }
}
