use movie_core::persist::{from_bytes, load_index, save_index, to_bytes, IndexPaths};
use movie_core::{build, rank, CatalogRow, DisplayFields, Error, Recommender, SimilarityIndex};

fn tiny_catalog() -> Vec<CatalogRow> {
    vec![
        CatalogRow::new(1, "Alpha", "space adventure heroic"),
        CatalogRow::new(2, "Beta", "space adventure comic"),
        CatalogRow::new(3, "Gamma", "romance drama slow"),
    ]
}

fn movie_catalog() -> Vec<CatalogRow> {
    let mut knight = CatalogRow::new(155, "The Dark Knight", "action crime drama dc superhero christianbale heathledger christophernolan");
    knight.display = DisplayFields {
        genres: vec!["action".into(), "crime".into(), "drama".into()],
        rating: Some(4.2),
        overview: Some("Batman raises the stakes in his war on crime.".into()),
        ..Default::default()
    };
    vec![
        CatalogRow::new(272, "Batman Begins", "action crime drama dc superhero christianbale michaelcaine christophernolan"),
        knight,
        CatalogRow::new(49026, "The Dark Knight Rises", "action crime drama thriller dc superhero christianbale tomhardy christophernolan"),
        CatalogRow::new(27205, "Inception", "action sciencefiction adventure dream heist leonardodicaprio christophernolan"),
        CatalogRow::new(13, "Forrest Gump", "comedy drama romance vietnamwar tomhanks robertzemeckis"),
        CatalogRow::new(862, "Toy Story", "animation comedy family toy tomhanks johnlasseter"),
    ]
}

#[test]
fn alpha_recommends_beta_then_gamma() {
    let rec = Recommender::new(build(tiny_catalog()).unwrap());
    assert_eq!(rec.recommend_titles("Alpha", 2).unwrap(), vec!["Beta", "Gamma"]);
}

#[test]
fn empty_catalog_is_rejected() {
    assert!(matches!(build(Vec::new()), Err(Error::EmptyCorpus)));
}

#[test]
fn misspelled_title_resolves_like_the_exact_one() {
    let rec = Recommender::new(build(movie_catalog()).unwrap());
    let exact = rec.resolve("The Dark Knight").unwrap();
    assert_eq!(rec.resolve("the dark knght").unwrap(), exact);
    assert_eq!(rec.index().row(exact).unwrap().id, 155);
}

#[test]
fn nonsense_title_is_not_found() {
    let rec = Recommender::new(build(movie_catalog()).unwrap());
    let err = rec.recommend("totally unrelated nonsense string", 5).unwrap_err();
    assert!(matches!(err, Error::TitleNotFound(_)));
}

#[test]
fn nolan_batman_films_rank_first() {
    let rec = Recommender::new(build(movie_catalog()).unwrap());
    let titles = rec.recommend_titles("The Dark Knight", 2).unwrap();
    assert_eq!(titles, vec!["Batman Begins", "The Dark Knight Rises"]);
}

#[test]
fn results_are_bounded_and_exclude_the_query() {
    let index = build(movie_catalog()).unwrap();
    for p in 0..index.len() {
        let q = index.vector(p).unwrap();
        let hits = rank(q, &index, 3, Some(p));
        assert!(hits.len() <= 3);
        assert!(hits.iter().all(|h| h.position != p));
        let all = rank(q, &index, 100, Some(p));
        assert_eq!(all.len(), index.len() - 1);
    }
}

fn assert_same_behavior(a: &SimilarityIndex, b: &SimilarityIndex) {
    assert_eq!(a.len(), b.len());
    assert_eq!(a.dimension(), b.dimension());
    assert_eq!(a.rows(), b.rows());
    for p in 0..a.len() {
        let hits_a = rank(a.vector(p).unwrap(), a, 4, Some(p));
        let hits_b = rank(b.vector(p).unwrap(), b, 4, Some(p));
        assert_eq!(hits_a, hits_b);
    }
    let ra = Recommender::new(a.clone());
    let rb = Recommender::new(b.clone());
    for q in ["the dark knght", "toy stroy", "inception", "nothing like any title at all"] {
        assert_eq!(ra.resolve(q).ok(), rb.resolve(q).ok());
    }
}

#[test]
fn bytes_round_trip_preserves_behavior() {
    let index = build(movie_catalog()).unwrap();
    let loaded = from_bytes(&to_bytes(&index).unwrap()).unwrap();
    assert_same_behavior(&index, &loaded);
    assert_eq!(loaded.row(1).unwrap().display.rating, Some(4.2));
}

#[test]
fn file_round_trip_preserves_behavior() {
    let dir = tempfile::tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    let index = build(movie_catalog()).unwrap();
    save_index(&paths, &index).unwrap();
    let loaded = load_index(&paths).unwrap();
    assert_same_behavior(&index, &loaded);
}

#[test]
fn corrupted_file_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    save_index(&paths, &build(tiny_catalog()).unwrap()).unwrap();
    let mut bytes = std::fs::read(paths.index()).unwrap();
    bytes.truncate(bytes.len() / 2);
    std::fs::write(paths.index(), &bytes).unwrap();
    assert!(matches!(load_index(&paths), Err(Error::IndexLoad(_))));
}
