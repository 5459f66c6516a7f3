use engine::{sample_documents, Document, EngineConfig, SearchEngine};
use std::io::Write;

fn news_corpus() -> Vec<Document> {
    let rows = [
        ("Stocks rally as markets rebound", "Global stock markets rebounded after central bank comments eased investor fears.", "Business"),
        ("Markets slide on inflation data", "Stock markets fell sharply as inflation data surprised investors.", "Business"),
        ("Central bank holds interest rates", "The central bank kept rates unchanged, citing slowing inflation.", "Business"),
        ("Local team wins football final", "The football club won the championship final in extra time.", "Sports"),
        ("Football star signs new contract", "A football star signed a contract extension with the club.", "Sports"),
        ("Climate summit ends with pledge", "Leaders at the climate summit pledged to cut emissions.", "Environment"),
        ("Heatwave linked to climate change", "Scientists linked the record heatwave to climate change and emissions.", "Environment"),
        ("New vaccine approved by regulators", "Regulators approved a vaccine after trials showed strong results.", "Health"),
        ("Hospitals prepare for flu season", "Hospitals urged vaccine uptake ahead of the flu season.", "Health"),
        ("Startup raises funding for AI chips", "The startup raised funding to build chips for neural networks.", "Technology"),
        ("Neural networks beat doctors at scans", "Researchers trained neural networks that read hospital scans.", "Technology"),
        ("Election campaign enters final week", "Candidates made final appeals to voters before the election.", "Politics"),
    ];
    rows.iter()
        .enumerate()
        .map(|(i, (title, content, category))| Document {
            id: (i + 1).to_string(),
            title: title.to_string(),
            content: content.to_string(),
            category: Some(category.to_string()),
        })
        .collect()
}

fn lexical_only() -> EngineConfig {
    let mut cfg = EngineConfig::default();
    cfg.semantic.enabled = false;
    cfg
}

#[test]
fn neural_networks_query_ranks_deep_learning_first() {
    let engine = SearchEngine::build(sample_documents(), EngineConfig::default()).unwrap();
    let resp = engine.search("neural networks", None);
    assert!(!resp.results.is_empty());
    assert_eq!(resp.results[0].id, "3");
    assert_eq!(resp.results[0].title, "Deep Learning Neural Networks");
    assert_eq!(resp.total_results, resp.results.len());

    // the lexical component alone is already positive
    let lexical = SearchEngine::build(sample_documents(), lexical_only()).unwrap();
    let resp = lexical.search("neural networks", None);
    assert_eq!(resp.results[0].id, "3");
    assert!(resp.results[0].score > 0.0);
}

#[test]
fn empty_and_blank_queries_short_circuit() {
    let engine = SearchEngine::build(sample_documents(), EngineConfig::default()).unwrap();
    for q in ["", "   ", "\t\n"] {
        let resp = engine.search(q, Some(5));
        assert!(resp.results.is_empty());
        assert_eq!(resp.total_results, 0);
        assert_eq!(resp.execution_time, 0.0);
        assert_eq!(resp.query, q);
    }
}

#[test]
fn identical_inputs_give_identical_rankings() {
    let a = SearchEngine::build(news_corpus(), EngineConfig::default()).unwrap();
    let b = SearchEngine::build(news_corpus(), EngineConfig::default()).unwrap();
    for q in ["stock markets", "football club", "climate emissions", "neural networks hospital"] {
        assert_eq!(a.search(q, Some(20)).results, b.search(q, Some(20)).results);
    }
}

#[test]
fn raising_threshold_never_adds_results() {
    let mut previous = usize::MAX;
    for threshold in [0.0, 0.01, 0.05, 0.1, 0.2, 0.4, 0.8] {
        let mut cfg = EngineConfig::default();
        cfg.ranking.min_similarity = threshold;
        let engine = SearchEngine::build(news_corpus(), cfg).unwrap();
        let count = engine.search("stock markets inflation", Some(100)).total_results;
        assert!(count <= previous, "threshold {threshold} returned {count} > {previous}");
        previous = count;
    }
}

#[test]
fn result_count_is_bounded() {
    let engine = SearchEngine::build(news_corpus(), EngineConfig::default()).unwrap();
    assert!(engine.search("markets", Some(1)).results.len() <= 1);
    assert!(engine.search("football club final", Some(2)).results.len() <= 2);
    // zero is raised to one
    assert!(engine.search("markets", Some(0)).results.len() <= 1);

    let mut cfg = EngineConfig::default();
    cfg.ranking.max_results = 2;
    cfg.ranking.min_similarity = 0.0;
    let capped = SearchEngine::build(news_corpus(), cfg).unwrap();
    assert_eq!(capped.search("markets", Some(1000)).results.len(), 2);
}

#[test]
fn scores_stay_in_unit_range_and_sorted() {
    let engine = SearchEngine::build(news_corpus(), EngineConfig::default()).unwrap();
    for q in ["stock markets", "climate change heatwave", "vaccine", "central bank rates inflation"] {
        let results = engine.search(q, Some(100)).results;
        assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.score)));
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }
}

#[test]
fn lexical_only_scores_are_scaled_lexical_scores() {
    let scaled = SearchEngine::build(news_corpus(), lexical_only()).unwrap();
    let mut cfg = lexical_only();
    cfg.ranking.rescale_lexical_only = true;
    let raw = SearchEngine::build(news_corpus(), cfg).unwrap();
    assert!(!scaled.has_semantic());

    // the threshold applies to the lexical score, so both keep the same candidates
    for q in ["stock markets", "football", "climate emissions"] {
        let a = scaled.search(q, Some(100)).results;
        let b = raw.search(q, Some(100)).results;
        let ids_a: Vec<_> = a.iter().map(|r| r.id.clone()).collect();
        let ids_b: Vec<_> = b.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids_a, ids_b);
        for (x, y) in a.iter().zip(&b) {
            assert!((x.score - 0.7 * y.score).abs() < 1e-6);
        }
    }
}

#[test]
fn unseen_terms_match_nothing() {
    let engine = SearchEngine::build(news_corpus(), EngineConfig::default()).unwrap();
    let resp = engine.search("zyzzyva quokka", None);
    assert!(resp.results.is_empty());
    assert_eq!(resp.total_results, 0);
}

#[test]
fn punctuation_in_query_is_ignored() {
    let engine = SearchEngine::build(news_corpus(), lexical_only()).unwrap();
    assert_eq!(engine.search("FOOTBALL!!!", None).results, engine.search("football", None).results);
}

#[test]
fn pretrained_embeddings_feed_semantic_scores() {
    let mut table = tempfile::NamedTempFile::new().unwrap();
    writeln!(table, "neural 0.9 0.1\nnetworks 0.8 0.2\ndeep 0.7 0.3\nlearning 0.6 0.4\nlanguage 0.1 0.9").unwrap();
    let mut cfg = EngineConfig::default();
    cfg.semantic.pretrained = Some(table.path().to_path_buf());
    let engine = SearchEngine::build(sample_documents(), cfg).unwrap();
    assert!(engine.has_semantic());
    let top = &engine.search("neural networks", None).results[0];
    assert_eq!(top.id, "3");
    assert!(top.score > 0.3);
}

#[test]
fn broken_embeddings_degrade_to_lexical() {
    let mut table = tempfile::NamedTempFile::new().unwrap();
    writeln!(table, "neural 0.9 0.1\nnetworks 0.8").unwrap();
    let mut cfg = EngineConfig::default();
    cfg.semantic.pretrained = Some(table.path().to_path_buf());
    let engine = SearchEngine::build(sample_documents(), cfg).unwrap();
    assert!(!engine.has_semantic());
    assert_eq!(engine.search("neural networks", None).results[0].id, "3");
}

#[test]
fn bootstrap_reads_jsonl_and_falls_back_to_sample() {
    let missing = SearchEngine::bootstrap("/no/such/corpus.json", lexical_only()).unwrap();
    assert_eq!(missing.documents(), &sample_documents()[..]);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"headline": "Rates held", "short_description": "The bank held rates.", "category": "BUSINESS"}}"#).unwrap();
    writeln!(file, r#"{{"headline": "No body", "short_description": ""}}"#).unwrap();
    writeln!(file, r#"{{"headline": "Rates cut", "short_description": "Another bank cut rates."}}"#).unwrap();
    let engine = SearchEngine::bootstrap(file.path(), lexical_only()).unwrap();
    let docs = engine.documents();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].id, "1");
    assert_eq!(docs[1].id, "3");
    assert_eq!(docs[1].category.as_deref(), Some("General"));
}
