use std::io::{BufRead, Write};

use anyhow::Result;

use crate::error::Error;
use crate::geography::{OccupancyGrid, TrailNetwork, TrailSelection};
use crate::species::SpeciesCatalogue;

/// Asks questions until the answer is usable.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Prompter { input, output }
    }

    /// Where results are printed between questions.
    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question}")?;
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            return Err(Error::InputClosed.into());
        }
        Ok(answer.trim().to_owned())
    }

    pub fn choose_trail<'a>(&mut self, network: &'a TrailNetwork) -> Result<TrailSelection<'a>> {
        loop {
            let name = self.ask("\nPlease enter a trail name, for example 'Milford Track': ")?;
            match network.select(&name) {
                Ok(selection) => {
                    writeln!(self.output, "\nTrail found, thank you")?;
                    return Ok(selection);
                }
                Err(err) => {
                    tracing::debug!("rejected trail name {name:?}");
                    writeln!(self.output, "{err} Please check for errors and try again.")?;
                }
            }
        }
    }

    /// Returns the grid column of the chosen species.
    pub fn choose_species(
        &mut self,
        catalogue: &SpeciesCatalogue,
        grid: &OccupancyGrid,
    ) -> Result<usize> {
        loop {
            let code = self.ask(
                "\nPlease enter a species code, for example 'kiwbro' for Kiwi, \
                 or enter 'list' to return a list of codes and species: \n",
            )?;
            if code.eq_ignore_ascii_case("list") {
                write!(self.output, "\n{}", catalogue.listing())?;
                continue;
            }
            match grid.species_index(&code) {
                Some(column) => return Ok(column),
                None => {
                    tracing::debug!("rejected species code {code:?}");
                    writeln!(self.output, "{}", Error::UnknownSpecies(code))?;
                }
            }
        }
    }

    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("\n{question} (y/n): "))?;
        Ok(answer.eq_ignore_ascii_case("y"))
    }
}
