/// Categorical weight lookup with a fallback for values the table doesn't know.
#[derive(Debug, Clone, Copy)]
pub struct WeightTable {
    pub entries: &'static [(&'static str, i32)],
    pub fallback: i32,
}

impl WeightTable {
    /// Weight for a free-text form value.
    ///
    /// Labels match exactly after normalization, or as the trailing words of the
    /// value ("Riego por goteo" matches `goteo`). The longest matching label wins.
    pub fn weight(&self, value: &str) -> i32 {
        self.lookup(value).unwrap_or(self.fallback)
    }

    pub fn lookup(&self, value: &str) -> Option<i32> {
        let key = normalize(value);
        if key.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .filter(|(label, _)| label_matches(&key, label))
            .max_by_key(|(label, _)| label.len())
            .map(|(_, weight)| *weight)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.lookup(value).is_some()
    }
}

fn label_matches(key: &str, label: &str) -> bool {
    key == label
        || key
            .strip_suffix(label)
            .map(|head| head.ends_with(' '))
            .unwrap_or(false)
}

/// Lowercase, strip Spanish diacritics, and collapse separators.
pub fn normalize(value: &str) -> String {
    let folded: String = value
        .trim()
        .chars()
        .map(|c| match c {
            'á' | 'Á' | 'à' | 'À' => 'a',
            'é' | 'É' | 'è' | 'È' => 'e',
            'í' | 'Í' | 'ì' | 'Ì' => 'i',
            'ó' | 'Ó' | 'ò' | 'Ò' => 'o',
            'ú' | 'Ú' | 'ù' | 'Ù' | 'ü' | 'Ü' => 'u',
            'ñ' | 'Ñ' => 'n',
            '_' | '-' => ' ',
            other => other.to_ascii_lowercase(),
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when `value` names the same category as `label` under [`normalize`].
pub fn is_category(value: &str, label: &str) -> bool {
    label_matches(&normalize(value), label)
}
