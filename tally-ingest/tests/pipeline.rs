use tally_core::{BankProfile, DebitCreditRule, PositionedToken, Side};
use tally_ingest::{builtin_config, builtin_profile, is_transaction, Engine, Extraction};

fn tok(text: &str, page: usize, x0: f64, x1: f64, top: f64) -> PositionedToken {
    PositionedToken::new(text, page, x0, top, x1, top + 9.0)
}

fn bbva() -> BankProfile {
    builtin_profile("bbva_mx").unwrap()
}

fn header(page: usize, top: f64) -> PositionedToken {
    tok("Detalle de Movimientos Realizados", page, 20.0, 300.0, top)
}

#[test]
fn test_single_movement_row() {
    let p = bbva();
    let out = Engine::new(&p).run(vec![
        header(0, 80.0),
        tok("02 ENE", 0, 20.0, 55.0, 100.0),
        tok("tienda A", 0, 150.0, 200.0, 100.0),
        tok("150.00", 0, 340.0, 380.0, 100.0),
    ]);
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].date, "02 ENE");
    assert_eq!(out.records[0].description, "tienda A");
    assert_eq!(out.records[0].debit.as_deref(), Some("150.00"));
    assert_eq!(out.records[0].credit, None);
}

#[test]
fn test_collapsed_row_with_two_dates_splits() {
    let p = bbva();
    let out = Engine::new(&p).run(vec![
        header(0, 80.0),
        tok("02 ENE", 0, 20.0, 55.0, 100.0),
        tok("tienda A", 0, 150.0, 200.0, 100.0),
        tok("150.00", 0, 340.0, 380.0, 100.0),
        tok("03 ENE", 0, 20.0, 55.0, 104.0),
        tok("tienda B", 0, 150.0, 200.0, 104.0),
        tok("75.00", 0, 345.0, 380.0, 104.0),
    ]);
    assert_eq!(out.stats.rows_split, 1);
    assert_eq!(out.records.len(), 2);
    assert_eq!(out.records[0].date, "02 ENE");
    assert_eq!(out.records[0].description, "tienda A");
    assert_eq!(out.records[0].debit.as_deref(), Some("150.00"));
    assert_eq!(out.records[1].date, "03 ENE");
    assert_eq!(out.records[1].description, "tienda B");
    assert_eq!(out.records[1].debit.as_deref(), Some("75.00"));
}

fn assert_two_movements(out: &Extraction) {
    assert_eq!(out.stats.rows_split, 1);
    let got: Vec<(&str, &str, Option<&str>)> = out
        .records
        .iter()
        .map(|r| (r.date.as_str(), r.description.as_str(), r.debit.as_deref()))
        .collect();
    assert_eq!(
        got,
        vec![("02 ENE", "tienda A", Some("150.00")), ("03 ENE", "tienda B", Some("75.00"))]
    );
}

#[test]
fn test_tightly_collapsed_row_splits_with_stock_profile() {
    let p = bbva();
    let out = Engine::new(&p).run(vec![
        header(0, 80.0),
        tok("02 ENE", 0, 20.0, 55.0, 100.0),
        tok("tienda A", 0, 150.0, 200.0, 100.0),
        tok("150.00", 0, 340.0, 380.0, 100.0),
        tok("03 ENE", 0, 20.0, 55.0, 102.5),
        tok("tienda B", 0, 150.0, 200.0, 102.5),
        tok("75.00", 0, 345.0, 380.0, 102.5),
    ]);
    assert_two_movements(&out);
}

#[test]
fn test_token_between_sub_lines_joins_the_nearer_one() {
    let p = bbva();
    let out = Engine::new(&p).run(vec![
        header(0, 80.0),
        tok("02 ENE", 0, 20.0, 55.0, 100.0),
        tok("tienda A", 0, 150.0, 200.0, 101.6),
        tok("150.00", 0, 340.0, 380.0, 100.0),
        tok("03 ENE", 0, 20.0, 55.0, 104.5),
        tok("tienda B", 0, 150.0, 200.0, 104.5),
        tok("75.00", 0, 345.0, 380.0, 104.5),
    ]);
    assert_two_movements(&out);
}

#[test]
fn test_line_markers_pick_the_side() {
    let mut cfg = builtin_config("chase_debit").unwrap();
    cfg.debit_credit = DebitCreditRule::LineMarker {
        debit_markers: vec!["DR".into()],
        credit_markers: vec!["CR".into()],
        default: Side::Credit,
    };
    let p = BankProfile::from_config(&cfg).unwrap();

    let out = Engine::new(&p).run(vec![
        tok("TRANSACTION DETAIL", 0, 20.0, 150.0, 60.0),
        tok("04/22", 0, 25.0, 55.0, 100.0),
        tok("ATM WITHDRAWAL", 0, 100.0, 200.0, 100.0),
        tok("DR", 0, 380.0, 395.0, 100.0),
        tok("60.00", 0, 410.0, 460.0, 100.0),
        tok("04/23", 0, 25.0, 55.0, 120.0),
        tok("REFUND CR", 0, 100.0, 200.0, 120.0),
        tok("15.00", 0, 410.0, 460.0, 120.0),
        tok("04/24", 0, 25.0, 55.0, 140.0),
        tok("INTEREST PAID", 0, 100.0, 200.0, 140.0),
        tok("0.12", 0, 410.0, 460.0, 140.0),
    ]);
    let got: Vec<(&str, Option<&str>, Option<&str>)> = out
        .records
        .iter()
        .map(|r| (r.description.as_str(), r.debit.as_deref(), r.credit.as_deref()))
        .collect();
    assert_eq!(
        got,
        vec![
            ("ATM WITHDRAWAL", Some("60.00"), None),
            ("REFUND", None, Some("15.00")),
            ("INTEREST PAID", None, Some("0.12")),
        ]
    );
}

#[test]
fn test_unreadable_date_kept_when_description_is_strong() {
    let p = bbva();
    let out = Engine::new(&p).run(vec![
        header(0, 80.0),
        tok("02 ENE", 0, 20.0, 55.0, 100.0),
        tok("tienda A", 0, 150.0, 200.0, 100.0),
        tok("150.00", 0, 340.0, 380.0, 100.0),
        tok("O2/EN3", 0, 20.0, 55.0, 120.0),
        tok("TRASPASO CUENTA PROPIA", 0, 150.0, 300.0, 120.0),
        tok("500.00", 0, 340.0, 380.0, 120.0),
    ]);
    assert_eq!(out.records.len(), 2);
    let lenient = &out.records[1];
    assert_eq!(lenient.date, "O2/EN3");
    assert_eq!(lenient.description, "TRASPASO CUENTA PROPIA");
    assert_eq!(lenient.debit.as_deref(), Some("500.00"));
    assert!(is_transaction(lenient, &p));
}

#[test]
fn test_operation_and_settlement_balances_kept_apart() {
    let p = bbva();
    let out = Engine::new(&p).run(vec![
        header(0, 80.0),
        tok("02/JUN", 0, 20.0, 55.0, 100.0),
        tok("SPEI ENVIADO", 0, 150.0, 230.0, 100.0),
        tok("300.00", 0, 340.0, 380.0, 100.0),
        tok("4,700.00", 0, 475.0, 510.0, 100.0),
        tok("4,650.00", 0, 525.0, 565.0, 100.0),
    ]);
    assert_eq!(out.records.len(), 1);
    let r = &out.records[0];
    assert_eq!(r.debit.as_deref(), Some("300.00"));
    assert_eq!(r.balance.as_deref(), Some("4,700.00"));
    assert_eq!(r.settlement_balance.as_deref(), Some("4,650.00"));
}

#[test]
fn test_continuation_fills_empty_description() {
    let p = bbva();
    let out = Engine::new(&p).run(vec![
        header(0, 80.0),
        tok("02 ENE", 0, 20.0, 55.0, 100.0),
        tok("150.00", 0, 340.0, 380.0, 100.0),
        tok("ref: 00912", 0, 150.0, 210.0, 112.0),
    ]);
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].description, "ref: 00912");
    assert_eq!(out.records[0].debit.as_deref(), Some("150.00"));
}

#[test]
fn test_end_marker_stops_engine() {
    let p = bbva();
    let before = Engine::new(&p).run(vec![
        header(0, 80.0),
        tok("02 ENE", 0, 20.0, 55.0, 100.0),
        tok("tienda A", 0, 150.0, 200.0, 100.0),
        tok("150.00", 0, 340.0, 380.0, 100.0),
    ]);

    let out = Engine::new(&p).run(vec![
        header(0, 80.0),
        tok("02 ENE", 0, 20.0, 55.0, 100.0),
        tok("tienda A", 0, 150.0, 200.0, 100.0),
        tok("150.00", 0, 340.0, 380.0, 100.0),
        tok("Total de Movimientos", 0, 20.0, 200.0, 120.0),
        tok("03 ENE", 0, 20.0, 55.0, 140.0),
        tok("tienda B", 0, 150.0, 200.0, 140.0),
        tok("75.00", 0, 340.0, 380.0, 140.0),
        header(1, 80.0),
        tok("04 ENE", 1, 20.0, 55.0, 100.0),
        tok("tienda C", 1, 150.0, 200.0, 100.0),
        tok("10.00", 1, 340.0, 380.0, 100.0),
    ]);
    assert!(out.stats.section_closed);
    assert_eq!(out.records, before.records);
}

#[test]
fn test_shared_column_negative_goes_to_debit_only() {
    let p = builtin_profile("chase_debit").unwrap();
    let out = Engine::new(&p).run(vec![
        tok("TRANSACTION DETAIL", 0, 20.0, 150.0, 60.0),
        tok("04/22", 0, 25.0, 55.0, 100.0),
        tok("Discover E-Payment", 0, 100.0, 200.0, 100.0),
        tok("-$50.00", 0, 410.0, 460.0, 100.0),
        tok("53.70", 0, 490.0, 520.0, 100.0),
    ]);
    assert_eq!(out.records.len(), 1);
    let r = &out.records[0];
    assert_eq!(r.debit.as_deref(), Some("50.00"));
    assert_eq!(r.credit, None);
    assert_eq!(r.balance.as_deref(), Some("53.70"));
}

fn multi_page_statement() -> Vec<Vec<PositionedToken>> {
    vec![
        vec![
            tok("BBVA MEXICO, S.A.", 0, 20.0, 200.0, 20.0),
            tok("Saldo Anterior", 0, 20.0, 120.0, 40.0),
            tok("1,000.00", 0, 480.0, 540.0, 40.0),
            header(0, 80.0),
            tok("01/JUN", 0, 20.0, 55.0, 100.0),
            tok("01/JUN", 0, 65.0, 100.0, 100.0),
            tok("SPEI RECIBIDO", 0, 150.0, 230.0, 100.0),
            tok("1,200.00", 0, 410.0, 460.0, 100.0),
            tok("2,200.00", 0, 480.0, 540.0, 100.0),
            tok("BANCO AZTECA", 0, 150.0, 230.0, 112.0),
            tok("02/JUN", 0, 20.0, 55.0, 124.0),
            tok("02/JUN", 0, 65.0, 100.0, 124.0),
            tok("PAGO TARJETA", 0, 150.0, 230.0, 124.0),
            tok("150.00", 0, 340.0, 380.0, 124.0),
            tok("2,050.00", 0, 480.0, 540.0, 124.0),
            tok("Pagina 1 de 2", 0, 250.0, 330.0, 700.0),
        ],
        vec![
            header(0, 30.0),
            tok("03/JUN", 0, 20.0, 55.0, 100.0),
            tok("03/JUN", 0, 65.0, 100.0, 100.0),
            tok("COMISION", 0, 150.0, 230.0, 100.0),
            tok("50.00", 0, 345.0, 380.0, 100.0),
            tok("2,000.00", 0, 480.0, 540.0, 100.0),
            tok("Total de Movimientos", 0, 20.0, 200.0, 130.0),
            tok("04/JUN", 0, 20.0, 55.0, 150.0),
            tok("AFTER END", 0, 150.0, 230.0, 150.0),
            tok("9.00", 0, 345.0, 380.0, 150.0),
        ],
    ]
}

#[test]
fn test_multi_page_statement() {
    let p = bbva();
    let out = Engine::new(&p).run_pages(multi_page_statement());
    assert_eq!(out.records.len(), 3);

    let first = &out.records[0];
    assert_eq!(first.date, "01/JUN");
    assert_eq!(first.settlement_date.as_deref(), Some("01/JUN"));
    assert_eq!(first.description, "SPEI RECIBIDO BANCO AZTECA");
    assert_eq!(first.credit.as_deref(), Some("1,200.00"));
    assert_eq!(first.balance.as_deref(), Some("2,200.00"));

    assert_eq!(out.records[2].description, "COMISION");
    assert_eq!(out.records[2].page, 1);
}

#[test]
fn test_records_stay_inside_section() {
    let p = bbva();
    let out = Engine::new(&p).run_pages(multi_page_statement());
    let start = out.stats.section_start.unwrap();
    let end = out.stats.section_end.unwrap();
    assert_eq!((start.page, end.page), (0, 1));
    assert!(out.records.iter().all(|r| r.page >= start.page && r.page <= end.page));
    assert!(out.records.iter().all(|r| r.description != "AFTER END"));
}

#[test]
fn test_accepted_records_are_transactions() {
    let p = bbva();
    let out = Engine::new(&p).run_pages(multi_page_statement());
    assert!(out.records.iter().all(|r| is_transaction(r, &p)));
}

#[test]
fn test_no_amount_in_both_debit_and_credit_when_shared() {
    let p = builtin_profile("chase_debit").unwrap();
    let out = Engine::new(&p).run(vec![
        tok("TRANSACTION DETAIL", 0, 20.0, 150.0, 60.0),
        tok("04/22", 0, 25.0, 55.0, 100.0),
        tok("COFFEE", 0, 100.0, 200.0, 100.0),
        tok("-4.50", 0, 410.0, 440.0, 100.0),
        tok("4.50", 0, 441.0, 465.0, 100.0),
        tok("4.50", 0, 410.0, 440.0, 112.0),
    ]);
    for r in &out.records {
        assert!(!(r.debit.is_some() && r.credit.is_some()));
    }
}

#[test]
fn test_runs_are_deterministic() {
    let p = bbva();
    let a = Engine::new(&p).run_pages(multi_page_statement());
    let b = Engine::new(&p).run_pages(multi_page_statement());
    assert_eq!(
        serde_json::to_string(&a.records).unwrap(),
        serde_json::to_string(&b.records).unwrap()
    );
    assert_eq!(a.stats, b.stats);
}
