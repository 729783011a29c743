// render.rs - Text report of the global grid

use std::io::{self, Write};

use crate::aggregate::GridObserver;
use crate::grid::GlobalGrid;

/// D lines of D comma-separated cell values.
pub fn format_grid(grid: &GlobalGrid) -> String {
    let mut out = String::with_capacity(grid.dimension() * grid.dimension() * 3);
    for row in grid.rows() {
        let line: Vec<&str> = row.iter().map(|&alive| if alive { "1" } else { "0" }).collect();
        out.push_str(&line.join(", "));
        out.push('\n');
    }
    out
}

/// Writes each observed frame the way the coordinator reports it.
///
/// Observers cannot fail, so the first write error is kept and returned by
/// [`TextReporter::finish`]; later frames are dropped.
pub struct TextReporter<W> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write + Send> TextReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    pub fn finish(mut self) -> io::Result<W> {
        match self.error.take() {
            Some(error) => Err(error),
            None => {
                self.out.flush()?;
                Ok(self.out)
            }
        }
    }

    fn write_frame(&mut self, generation: u64, grid: &GlobalGrid) -> io::Result<()> {
        if generation == 0 {
            writeln!(self.out, "Initial grid state:")?;
        } else {
            writeln!(self.out, "Iteration: {generation}")?;
        }
        self.out.write_all(format_grid(grid).as_bytes())?;
        writeln!(self.out)
    }
}

impl<W: Write + Send> GridObserver for TextReporter<W> {
    fn observe(&mut self, generation: u64, grid: &GlobalGrid) {
        if self.error.is_some() {
            return;
        }
        if let Err(error) = self.write_frame(generation, grid) {
            self.error = Some(error);
        }
    }
}
