//! 画像ごとの進捗表示

use indicatif::{ProgressBar, ProgressStyle};

/// 読み取り中の進捗バー
///
/// `start_image` は画像の処理を始める前に呼ばれるので、位置は「処理済み枚数」を指す。
/// `finish` で全枚数まで進めてから消す。
pub struct ImageProgress {
    bar: ProgressBar,
}

impl ImageProgress {
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        Self { bar }
    }

    /// 描画しないバー
    #[cfg(test)]
    fn hidden(total: usize) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(total as u64);
        Self { bar }
    }

    /// `index` 枚目（1始まり）の処理開始
    pub fn start_image(&self, index: usize, total: usize, name: &str) {
        self.bar.set_length(total as u64);
        self.bar.set_position(index.saturating_sub(1) as u64);
        self.bar.set_message(name.to_string());
    }

    /// 全枚数まで進めて表示を消す
    pub fn finish(&self) {
        if let Some(len) = self.bar.length() {
            self.bar.set_position(len);
        }
        self.bar.finish_and_clear();
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn length(&self) -> Option<u64> {
        self.bar.length()
    }
}
