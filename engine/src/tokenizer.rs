use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref STRIP: Regex = Regex::new(r"[^a-z0-9\s]").expect("valid regex");
    static ref SENTENCE_END: Regex = Regex::new(r"[.!?]+").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","across","after","afterwards","again","against","all","almost","alone","along",
            "already","also","although","always","am","among","amongst","amoungst","amount","an","and","another",
            "any","anyhow","anyone","anything","anyway","anywhere","are","around","as","at",
            "back","be","became","because","become","becomes","becoming","been","before","beforehand","behind",
            "being","below","beside","besides","between","beyond","bill","both","bottom","but","by",
            "call","can","cannot","cant","co","con","could","couldnt","cry",
            "de","describe","detail","do","done","down","due","during",
            "each","eg","eight","either","eleven","else","elsewhere","empty","enough","etc","even","ever","every",
            "everyone","everything","everywhere","except",
            "few","fifteen","fifty","fill","find","fire","first","five","for","former","formerly","forty","found",
            "four","from","front","full","further",
            "get","give","go",
            "had","has","hasnt","have","he","hence","her","here","hereafter","hereby","herein","hereupon","hers",
            "herself","him","himself","his","how","however","hundred",
            "i","ie","if","in","inc","indeed","interest","into","is","it","its","itself",
            "keep","last","latter","latterly","least","less","ltd",
            "made","many","may","me","meanwhile","might","mill","mine","more","moreover","most","mostly","move",
            "much","must","my","myself",
            "name","namely","neither","never","nevertheless","next","nine","no","nobody","none","noone","nor",
            "not","nothing","now","nowhere",
            "of","off","often","on","once","one","only","onto","or","other","others","otherwise","our","ours",
            "ourselves","out","over","own",
            "part","per","perhaps","please","put",
            "rather","re",
            "same","see","seem","seemed","seeming","seems","serious","several","she","should","show","side",
            "since","sincere","six","sixty","so","some","somehow","someone","something","sometime","sometimes",
            "somewhere","still","such","system",
            "take","ten","than","that","the","their","them","themselves","then","thence","there","thereafter",
            "thereby","therefore","therein","thereupon","these","they","thick","thin","third","this","those",
            "though","three","through","throughout","thru","thus","to","together","too","top","toward","towards",
            "twelve","twenty","two",
            "un","under","until","up","upon","us",
            "very","via",
            "was","we","well","were","what","whatever","when","whence","whenever","where","whereafter","whereas",
            "whereby","wherein","whereupon","wherever","whether","which","while","whither","who","whoever","whole",
            "whom","whose","why","will","with","within","without","would",
            "yet","you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Lowercase, drop everything outside `[a-z0-9\s]`, collapse whitespace and trim.
///
/// Corpus documents and queries must both pass through this function; the
/// fitted vocabularies only ever contain terms in its output alphabet.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = STRIP.replace_all(&lowered, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace tokens of an already normalized text.
pub fn tokens(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split_whitespace()
}

/// Lexical analyzer: word tokens of two or more characters, stop words removed
/// (when `stop_words` is set), then every n-gram with `min_n <= n <= max_n`.
pub fn analyze(normalized: &str, ngram_range: (usize, usize), stop_words: bool) -> Vec<String> {
    let words: Vec<&str> = tokens(normalized)
        .filter(|w| w.len() >= 2)
        .filter(|w| !(stop_words && is_stopword(w)))
        .collect();
    let (min_n, max_n) = ngram_range;
    let min_n = min_n.max(1);
    let mut grams = Vec::new();
    for n in min_n..=max_n {
        if n > words.len() { break; }
        for window in words.windows(n) {
            grams.push(window.join(" "));
        }
    }
    grams
}

/// Split raw text at runs of sentence punctuation and normalize each piece,
/// dropping pieces that normalize to nothing.
pub fn split_sentences(raw: &str) -> Vec<Vec<String>> {
    SENTENCE_END
        .split(raw)
        .map(normalize)
        .filter(|s| !s.is_empty())
        .map(|s| tokens(&s).map(str::to_string).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_and_case() {
        assert_eq!(normalize("  Hello, World!  It's 2024.\n"), "hello world its 2024");
    }

    #[test]
    fn analyzer_builds_bigrams_over_content_words() {
        let grams = analyze("the neural networks of deep learning", (1, 2), true);
        assert_eq!(
            grams,
            vec!["neural", "networks", "deep", "learning", "neural networks", "networks deep", "deep learning"]
        );
    }

    #[test]
    fn analyzer_drops_single_characters() {
        assert!(analyze("a b c x", (1, 1), false).is_empty());
    }

    #[test]
    fn sentences_are_normalized_independently() {
        let s = split_sentences("Deep learning rocks! Neural nets... why?");
        assert_eq!(s, vec![vec!["deep", "learning", "rocks"], vec!["neural", "nets"], vec!["why"]]);
    }
}
