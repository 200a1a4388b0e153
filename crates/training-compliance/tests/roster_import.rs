use std::io::Cursor;

use training_compliance::courses::{company_for_id, parse_roster, Company, UserId, UserRole};

#[test]
fn parses_roster_rows_and_derives_companies() {
    let csv = "\
name,id,part,group
An Nguyen,10000001,QA 1P,QA
Chi Tran,100000000001,,Apex Molding
";
    let import = parse_roster(Cursor::new(csv.as_bytes())).expect("roster parses");

    assert_eq!(import.users.len(), 2);
    assert_eq!(import.skipped_rows, 0);

    let an = &import.users[0];
    assert_eq!(an.id, UserId("10000001".to_string()));
    assert_eq!(an.company, Company::Staff);
    assert_eq!(an.role, UserRole::Standard);
    assert_eq!(an.part, "QA 1P");

    let chi = &import.users[1];
    assert_eq!(chi.company, Company::Vendor);
    assert_eq!(chi.part, "N/A", "missing part falls back to N/A");
    assert_eq!(chi.group, "Apex Molding");
}

#[test]
fn duplicate_ids_keep_the_first_occurrence() {
    let csv = "\
name,id,part,group
An Nguyen,10000001,QA 1P,QA
Someone Else,10000001,QA 2P,QA
";
    let import = parse_roster(Cursor::new(csv.as_bytes())).expect("roster parses");

    assert_eq!(import.users.len(), 1);
    assert_eq!(import.users[0].name, "An Nguyen");
    assert_eq!(import.users[0].part, "QA 1P");
}

#[test]
fn rows_missing_name_or_id_are_skipped_not_fatal() {
    let csv = "\
name,id,part,group
,10000001,QA 1P,QA
Binh Le,,QA 2P,QA
Cuong Pham,10000003,QA 3P,QA
";
    let import = parse_roster(Cursor::new(csv.as_bytes())).expect("roster parses");

    assert_eq!(import.users.len(), 1);
    assert_eq!(import.users[0].name, "Cuong Pham");
    assert_eq!(import.skipped_rows, 2);
}

#[test]
fn whitespace_is_trimmed_before_validation() {
    let csv = "\
name,id,part,group
  An Nguyen  ,  10000001 , QA 1P , QA
";
    let import = parse_roster(Cursor::new(csv.as_bytes())).expect("roster parses");

    assert_eq!(import.users[0].name, "An Nguyen");
    assert_eq!(import.users[0].id, UserId("10000001".to_string()));
    assert_eq!(import.users[0].company, Company::Staff);
}

#[test]
fn company_rule_requires_exactly_eight_digits() {
    assert_eq!(company_for_id(&UserId("10000001".to_string())), Company::Staff);
    assert_eq!(
        company_for_id(&UserId("100000000001".to_string())),
        Company::Vendor
    );
    assert_eq!(company_for_id(&UserId("1000001".to_string())), Company::Vendor);
    assert_eq!(company_for_id(&UserId("1000000a".to_string())), Company::Vendor);
}
