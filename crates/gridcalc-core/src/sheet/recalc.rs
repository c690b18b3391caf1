use gridcalc_engine::engine::{CellType, EvalContext, evaluate_formula};

use super::Sheet;

impl Sheet {
    pub fn needs_recalc(&self) -> bool {
        self.needs_recalc
    }

    /// Force the next [`Sheet::recalculate`] to run.
    pub fn mark_dirty(&mut self) {
        self.needs_recalc = true;
    }

    /// Re-evaluate every formula once, in row-major order.
    ///
    /// A formula reading a formula further down or to the right sees that
    /// cell's result from the previous pass. Returns the number of formulas
    /// evaluated; zero when nothing changed since the last pass.
    pub fn recalculate(&mut self) -> usize {
        if !self.needs_recalc {
            return 0;
        }
        let mut evaluated = 0;
        for i in 0..self.cells.len() {
            let Some(CellType::Formula { expr, .. }) = self.cells[i].as_deref().map(|c| &c.contents)
            else {
                continue;
            };
            let expr = expr.clone();
            let ctx = EvalContext::for_cell(i / self.cols(), i % self.cols(), self.limits);
            let result = evaluate_formula(self, &expr, &ctx);
            if let Some(CellType::Formula { cached, .. }) =
                self.cells[i].as_deref_mut().map(|c| &mut c.contents)
            {
                *cached = result;
            }
            evaluated += 1;
        }
        self.needs_recalc = false;
        tracing::debug!(evaluated, "recalculated sheet");
        evaluated
    }
}
