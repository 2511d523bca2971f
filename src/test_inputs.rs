/// Fragments that exercise the cleaner: watermark glyphs, labels, words,
/// quantities, separators and brackets.
pub(crate) const FRAGMENTS: [&str; 40] = [
    "告", "报", "源", "溯", "品", "鸡", "乡", "老", "菜", "验", "证", "合", "格",
    "配料", "味型", "最佳风味期", "烹饪方式", "制作工艺",
    "生姜", "切片", "老母鸡", "鸡汤", "娃娃菜", "下锅", "汤", "炒", "咸", "工",
    "0", "1.5", "3g", "2.5kg", ".",
    "，", "、", "；", "：", "（", "）", " ",
];

/// xorshift64; the same seed always yields the same sequence.
pub(crate) struct Xorshift(u64);

impl Xorshift {
    pub(crate) fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    pub(crate) fn below(&mut self, bound: usize) -> usize {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        usize::try_from(self.0 % bound as u64).unwrap_or_default()
    }
}

/// `count` strings of one to eight fragments each.
pub(crate) fn generated_cells(seed: u64, count: usize) -> Vec<String> {
    let mut rng = Xorshift::new(seed);
    (0..count)
        .map(|_| {
            let len = 1 + rng.below(8);
            (0..len)
                .map(|_| FRAGMENTS[rng.below(FRAGMENTS.len())])
                .collect::<String>()
        })
        .collect()
}
