use ccaa_scraper::extract::elections::parse_seat_table;
use ccaa_scraper::output;
use ccaa_scraper::process::{self, MergedRecord, Winner};
use std::env;
use std::fs;
use std::path::PathBuf;

fn work_dir(name: &str) -> PathBuf {
    let dir = env::temp_dir().join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

const GDP_CSV: &str = "\
Comunidades y Ciudades Autónomas,Valor,Nota
\"Madrid, Comunidad de\",42.198,
Cataluña,36.192,
Aragón,31.571,
Total Nacional,30.968,
";

const EDUCATION_TSV: &str = "\
Nivel de formación alcanzado\tComunidades y Ciudades Autónomas\tEdad\tPeriodo\tTotal
Educación Superior\tMadrid, Comunidad de\tDe 25 a 64 años\t2023\t50,3
Educación Superior\tCataluña\tDe 25 a 64 años\t2023\t43,1
Educación Superior\tAragón\tDe 25 a 64 años\t2023\t41,0
Educación Superior\tMadrid, Comunidad de\tDe 25 a 64 años\t2022\t48,0
Primera etapa de Educación Secundaria\tMadrid, Comunidad de\tDe 25 a 64 años\t2023\t20,0
";

#[test]
fn test_seat_table_fixture_parses() {
    let html = include_str!("fixtures/seat_table.html");
    let rows = parse_seat_table(html).expect("fixture should parse");

    // Four provinces; the TOTAL row is not data.
    assert_eq!(rows.len(), 4);

    let madrid = rows.iter().find(|r| r.province == "Madrid").unwrap();
    assert_eq!((madrid.seats_pp, madrid.seats_psoe), (16, 10));

    // Zaragoza's PP seats are rendered as marker elements, not digits.
    let zaragoza = rows.iter().find(|r| r.province == "Zaragoza").unwrap();
    assert_eq!((zaragoza.seats_pp, zaragoza.seats_psoe), (3, 3));
}

#[test]
fn test_full_pipeline() {
    let dir = work_dir("ccaa_scraper_e2e_full");

    // Stage 1 outputs, built from the fixture page and two synthetic
    // agency files. Andalucía exists only in the election data.
    let html = include_str!("fixtures/seat_table.html");
    let rows = parse_seat_table(html).unwrap();
    output::write_records(&dir.join(output::RAW_ELECTIONS_FILE), &rows).unwrap();
    fs::write(dir.join(output::RAW_GDP_FILE), GDP_CSV).unwrap();
    fs::write(dir.join(output::RAW_EDUCATION_FILE), EDUCATION_TSV).unwrap();

    // Stage 2.
    let summary = process::run(&dir).unwrap();
    assert_eq!(summary.regions_merged, 3);
    assert_eq!(summary.regions_lost, vec!["Andalucía"]);
    assert!(summary.provinces_ignored.is_empty());

    let records: Vec<MergedRecord> =
        output::read_records(&dir.join(output::MERGED_FILE)).unwrap();

    // Exactly the regions present in all three sources.
    let mut names: Vec<&str> = records.iter().map(|r| r.ccaa.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Aragón", "Cataluña", "Comunidad de Madrid"]);

    let madrid = records.iter().find(|r| r.ccaa == "Comunidad de Madrid").unwrap();
    assert_eq!(madrid.winner, Winner::Pp);
    assert_eq!((madrid.seats_pp, madrid.seats_psoe), (16, 10));
    assert_eq!(madrid.gdp_per_capita, 42198.0);
    // Only the latest period contributes to the education average.
    assert_eq!(madrid.pct_higher_education, 50.3);

    let cataluna = records.iter().find(|r| r.ccaa == "Cataluña").unwrap();
    assert_eq!(cataluna.winner, Winner::Psoe);

    let aragon = records.iter().find(|r| r.ccaa == "Aragón").unwrap();
    assert_eq!(aragon.winner, Winner::Tie);

    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_process_fails_without_raw_elections() {
    let dir = work_dir("ccaa_scraper_e2e_missing_input");
    fs::write(dir.join(output::RAW_GDP_FILE), GDP_CSV).unwrap();
    fs::write(dir.join(output::RAW_EDUCATION_FILE), EDUCATION_TSV).unwrap();

    assert!(process::run(&dir).is_err());

    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_process_fails_when_nothing_joins() {
    let dir = work_dir("ccaa_scraper_e2e_disjoint");

    let html = include_str!("fixtures/seat_table.html");
    let rows = parse_seat_table(html).unwrap();
    output::write_records(&dir.join(output::RAW_ELECTIONS_FILE), &rows).unwrap();
    fs::write(
        dir.join(output::RAW_GDP_FILE),
        "Comunidades,Valor\nNarnia,1.234\n",
    )
    .unwrap();
    fs::write(dir.join(output::RAW_EDUCATION_FILE), EDUCATION_TSV).unwrap();

    assert!(process::run(&dir).is_err());

    fs::remove_dir_all(dir).unwrap();
}
