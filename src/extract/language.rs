use super::LanguageDetector;

/// A candidate language and its confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageScore {
    /// ISO 639-1 tag.
    pub tag: String,
    pub score: f32,
}

const ENGLISH_STOPWORDS: &[&str] = &[
    "a", "about", "all", "an", "and", "are", "as", "at", "be", "but", "by", "can", "for", "from",
    "had", "has", "have", "he", "her", "his", "i", "if", "in", "into", "is", "it", "its", "not",
    "of", "on", "or", "our", "she", "so", "that", "the", "their", "them", "there", "they",
    "this", "to", "was", "we", "were", "what", "when", "which", "who", "will", "with", "you",
];

const POLISH_STOPWORDS: &[&str] = &[
    "a", "aby", "ale", "bo", "być", "był", "była", "było", "były", "co", "czy", "dla", "do",
    "gdy", "go", "i", "ich", "jak", "jako", "jest", "jego", "jej", "już", "lub", "ma", "mi",
    "na", "nie", "o", "od", "oraz", "po", "pod", "przez", "przy", "się", "są", "ta", "tak",
    "tego", "to", "tu", "w", "we", "z", "za", "że", "żeby",
];

const POLISH_LETTERS: &[char] = &['ą', 'ć', 'ę', 'ł', 'ń', 'ó', 'ś', 'ź', 'ż'];

/// Scores English and Polish by the share of stop words in the text.
///
/// Polish-only letters add a bonus to Polish, which separates the two on
/// short inputs with few function words.
#[derive(Debug, Default, Clone, Copy)]
pub struct StopwordDetector;

impl LanguageDetector for StopwordDetector {
    fn detect(&self, text: &str) -> Vec<LanguageScore> {
        let words: Vec<String> = text
            .split(|c: char| !c.is_alphabetic())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();

        if words.is_empty() {
            return Vec::new();
        }

        let total = words.len() as f32;
        let share = |list: &[&str]| {
            words.iter().filter(|w| list.contains(&w.as_str())).count() as f32 / total
        };

        let letters = text.chars().filter(|c| c.is_alphabetic()).count().max(1) as f32;
        let diacritics = text
            .chars()
            .flat_map(char::to_lowercase)
            .filter(|c| POLISH_LETTERS.contains(c))
            .count() as f32;

        let mut scores = vec![
            LanguageScore {
                tag: "en".to_string(),
                score: share(ENGLISH_STOPWORDS),
            },
            LanguageScore {
                tag: "pl".to_string(),
                score: share(POLISH_STOPWORDS) + 4.0 * diacritics / letters,
            },
        ];

        scores.retain(|s| s.score > 0.0);
        scores.sort_by(|a, b| b.score.total_cmp(&a.score));
        scores
    }
}
