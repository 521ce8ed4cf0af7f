use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::{
    fmt::Write,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

const PROGRESS_CHARS: &str = "━━";

const FETCH_TEMPLATE: &str = "{spinner:.yellow.bold} {elapsed_precise:.bold} {wide_bar:.blue/white.dim} {percent:.bold}  {pos:.yellow} pages ({msg:.bold.blue})";

/// Page counter shown on stderr while a search walks through the request queue.
#[derive(Debug)]
pub struct FetchProgress {
    bar: ProgressBar,
    posts: AtomicU64,
}

impl FetchProgress {
    pub fn new(pages: u64) -> Self {
        let bar = ProgressBar::new(pages).with_style(fetch_progress_style());
        bar.set_draw_target(ProgressDrawTarget::stderr());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_message("0 posts");
        Self {
            bar,
            posts: AtomicU64::new(0),
        }
    }

    /// Hidden bar, for non-interactive output.
    pub fn hidden(pages: u64) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(pages);
        Self {
            bar,
            posts: AtomicU64::new(0),
        }
    }

    /// Marks one more page as fetched.
    pub fn page_done(&self, posts: u64) {
        let total = self.posts.fetch_add(posts, Ordering::Relaxed) + posts;
        self.bar.inc(1);
        self.bar.set_message(format!("{total} posts"));
    }

    pub fn posts(&self) -> u64 {
        self.posts.load(Ordering::Relaxed)
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

fn fetch_progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(FETCH_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key("pos", |state: &ProgressState, w: &mut dyn Write| {
            let _ = write!(w, "{}/{}", state.pos(), state.len().unwrap_or_default());
        })
        .with_key("percent", |state: &ProgressState, w: &mut dyn Write| {
            let _ = write!(w, "{:>3.0}%", state.fraction() * 100_f32);
        })
        .progress_chars(PROGRESS_CHARS)
}

#[cfg(test)]
mod test {
    use super::FetchProgress;

    #[test]
    fn counts_pages_and_posts() {
        let progress = FetchProgress::hidden(3);
        progress.page_done(320);
        progress.page_done(12);
        assert_eq!(progress.position(), 2);
        assert_eq!(progress.posts(), 332);
        progress.finish();
    }
}
