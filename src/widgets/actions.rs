use hypertext::prelude::*;

/// A row of button-styled links, shown at the top of management pages.
pub struct Actions<'r> {
    pub options: &'r [(String, &'r str)],
}

impl<'r> Renderable for Actions<'r> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            div class="d-flex gap-2 mt-3 mb-3" {
                @for (link, text) in self.options {
                    a class="btn btn-outline-primary" href=(link) {
                        (text)
                    }
                }
            }
        }
        .render_to(buffer);
    }
}
