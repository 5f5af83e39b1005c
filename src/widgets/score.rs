use hypertext::prelude::*;

use crate::competitions::scoring::{
    JudgeScore,
    calc::{FinalScore, display_score, trimmed_positions},
};

/// The marks of one dive in judge order. Marks discarded by the trimming rule
/// are struck through.
pub struct JudgeMarks<'r> {
    pub marks: &'r [JudgeScore],
    pub num_judges: i64,
}

impl Renderable for JudgeMarks<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        let mut marks = self.marks.to_vec();
        marks.sort_by_key(|mark| mark.judge_number);

        let values = marks.iter().map(|mark| mark.value).collect::<Vec<_>>();
        let trimmed = trimmed_positions(&values, self.num_judges);

        maud! {
            div class="d-flex gap-2 flex-wrap" {
                @for (idx, mark) in marks.iter().enumerate() {
                    div class="border rounded px-2 py-1 text-center" {
                        div class="small text-muted" { "J" (mark.judge_number) }
                        @if trimmed.contains(&idx) {
                            s class="text-muted fs-5" { (mark.value) }
                        } @else {
                            span class="fs-5" { (mark.value) }
                        }
                    }
                }
            }
        }
        .render_to(buffer);
    }
}

pub struct ScoreBreakdown {
    pub score: FinalScore,
    pub difficulty: f64,
}

impl Renderable for ScoreBreakdown {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            p class="mt-2 mb-0" {
                (display_score(self.score.average))
                " × " (self.difficulty) " = "
                strong { (display_score(self.score.final_score)) }
            }
        }
        .render_to(buffer);
    }
}
