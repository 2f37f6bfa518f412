//! Statement-style sessions driven through `execute`.

mod models;

use mockalchemy::Select;
use mockalchemy::prelude::*;
use models::{Data, Entry, SomeClass, models};
use serde_json::json;

fn c() -> Expr {
    Expr::col("column")
}

fn some(pk1: i64, pk2: i64) -> Row {
    Row::from(&SomeClass::new(pk1, pk2))
}

fn foo() -> Select {
    select(Expr::text("foo"))
}

#[test]
fn execute_records_one_call_per_statement() {
    let mut session = UnifiedSession::new();
    let rows = session
        .execute(Select::new().filter(c().eq("one")).filter(c().eq("two")))
        .unwrap()
        .all();
    assert!(rows.is_empty());
    let rows = session
        .execute(Select::new().filter(c().eq("three")).filter(c().eq("four")))
        .unwrap()
        .all();
    assert!(rows.is_empty());

    let execute = session.method("execute");
    assert_eq!(execute.call_count(), 2);
    execute
        .assert_any_call(&call!(
            _,
            Select::new().filter(c().eq("one")).filter(c().eq("two"))
        ))
        .unwrap();
    execute
        .assert_any_call(&call!(
            _,
            Select::new().filter(c().eq("three")).filter(c().eq("four"))
        ))
        .unwrap();
}

#[test]
fn where_order_is_irrelevant() {
    let mut session = UnifiedSession::with_config(
        SessionConfig::new()
            .fixture(
                vec![call!(execute, foo().filter(c().eq("one")).filter(c().eq("two")))],
                [some(1, 1), some(2, 2)],
            )
            .fixture(
                vec![call!(
                    execute,
                    foo()
                        .filter(c().eq("one"))
                        .filter(c().eq("two"))
                        .order_by(c())
                )],
                [some(2, 2), some(1, 1)],
            )
            .fixture(
                vec![call!(execute, foo().filter(c().eq("three")))],
                [some(3, 3)],
            ),
    );

    let rows = session
        .execute(foo().filter(c().eq("one")).filter(c().eq("three")).order_by(c()))
        .unwrap()
        .all();
    assert!(rows.is_empty());

    let ascending = vec![some(1, 1), some(2, 2)];
    let rows = session
        .execute(foo().filter(c().eq("one")).filter(c().eq("two")))
        .unwrap()
        .all();
    assert_eq!(rows, ascending);

    let rows: Vec<Row> = session
        .execute(foo().filter(c().eq("one")).filter(c().eq("two")))
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(rows, ascending);

    let rows = session
        .execute(
            select(Expr::text("bar"))
                .filter(c().eq("one"))
                .filter(c().eq("two")),
        )
        .unwrap()
        .all();
    assert!(rows.is_empty());

    let rows = session
        .execute(foo().filter(c().eq("one")).filter(c().eq("two")).order_by(c()))
        .unwrap()
        .all();
    assert_eq!(rows, vec![some(2, 2), some(1, 1)]);

    let first = session
        .execute(foo().filter(c().eq("two")).filter(c().eq("one")))
        .unwrap()
        .first();
    assert_eq!(first, Some(some(1, 1)));

    let one = session
        .execute(foo().filter(c().eq("three")))
        .unwrap()
        .one()
        .unwrap();
    assert_eq!(one, some(3, 3));
}

#[test]
fn second_select_in_open_chain_is_not_ignored() {
    let mut session = UnifiedSession::with_config(SessionConfig::new().fixture(
        vec![call!(execute, select(Entry::table()))],
        [&Entry::named(1, "entry")],
    ));

    // reading only the rowcount leaves the chain open
    let pending = session.execute(select(Entry::table())).unwrap().rowcount();
    assert_eq!(pending, 1);
    let rows = session.execute(select(SomeClass::table())).unwrap().all();
    assert!(rows.is_empty());

    let execute = session.method("execute");
    assert_eq!(execute.call_count(), 1);
    assert_eq!(execute.call_args().unwrap().args().len(), 2);

    let rows = session.execute(select(Entry::table())).unwrap().all();
    assert_eq!(models::<Entry>(&rows), vec![Entry::named(1, "entry")]);
}

#[test]
fn insert_returning_then_select_then_delete() {
    let mut session = UnifiedSession::new();
    let scalar = session
        .execute_with(
            insert(SomeClass::table()).returning(),
            json!([{"pk1": 1, "pk2": 1}]),
        )
        .unwrap()
        .scalar()
        .unwrap();
    assert_eq!(scalar, Some(Scalar::Row(some(1, 1))));

    let inserted = session
        .execute_with(insert(SomeClass::table()), json!([{"pk1": 2, "pk2": 2}]))
        .unwrap()
        .rowcount();
    assert_eq!(inserted, 1);

    let rows = session.execute(select(SomeClass::table())).unwrap().all();
    assert_eq!(rows, vec![some(1, 1), some(2, 2)]);

    let deleted = session.execute(delete(SomeClass::table())).unwrap();
    assert_eq!(deleted.rowcount(), 2);
    let deleted = session.execute(delete(SomeClass::table())).unwrap();
    assert_eq!(deleted.rowcount(), 0);
}

#[test]
fn insert_into_several_tables() {
    let mut session = UnifiedSession::new();
    session
        .execute_with(insert(SomeClass::table()), json!([{"pk1": 1, "pk2": 2}]))
        .unwrap();
    session
        .execute_with(insert(Entry::table()), json!([{"pk1": 1, "name": "test"}]))
        .unwrap();
    session
        .execute_with(insert(Entry::table()), json!([{"pk1": 5, "name": "test"}]))
        .unwrap();

    assert_eq!(
        session.execute(delete(SomeClass::table())).unwrap().rowcount(),
        1
    );
    assert_eq!(
        session.execute(delete(SomeClass::table())).unwrap().rowcount(),
        0
    );
    assert_eq!(session.execute(select(Entry::table())).unwrap().count(), 2);
}

#[test]
fn insert_rejects_unknown_columns() {
    let mut session = UnifiedSession::new();
    let err = session
        .execute_with(insert(Entry::table()), json!({"pk1": 1, "colour": "red"}))
        .unwrap_err();
    assert!(err.to_string().contains("colour"));
    assert_eq!(session.execute(select(Entry::table())).unwrap().count(), 0);
}

#[test]
fn delete_where_targets_select_fixture() {
    let mut session = UnifiedSession::with_config(
        SessionConfig::new()
            .fixture(
                vec![call!(execute, select(Entry::table()).filter(Entry::pk1().lt(1)))],
                [&Entry::named(1, "test1")],
            )
            .fixture(
                vec![call!(execute, select(Entry::table()))],
                [&Entry::named(2, "test2")],
            ),
    );

    let rows = session
        .execute(select(Entry::table()).filter(Entry::pk1().lt(1)))
        .unwrap()
        .all();
    assert_eq!(models::<Entry>(&rows), vec![Entry::named(1, "test1")]);

    let deleted = session
        .execute(delete(Entry::table()).filter(Entry::pk1().lt(1)))
        .unwrap();
    assert_eq!(deleted.rowcount(), 1);

    let rows = session.execute(select(Entry::table())).unwrap().all();
    assert_eq!(models::<Entry>(&rows), vec![Entry::named(2, "test2")]);

    let rows = session
        .execute(select(Entry::table()).filter(Entry::pk1().lt(1)))
        .unwrap()
        .all();
    assert!(rows.is_empty());

    let mut empty = UnifiedSession::new();
    assert_eq!(empty.execute(delete(Entry::table())).unwrap().rowcount(), 0);
}

#[test]
fn complex_session_through_statements() {
    let lt = || Data::data_p1().lt(13);
    let ge = || Data::data_p1().ge(13);
    let mut session = UnifiedSession::with_config(
        SessionConfig::new()
            .fixture(
                vec![call!(execute, select(Data::table()).filter(lt()))],
                [
                    &Data::new(1, 11.4, 13.5),
                    &Data::new(2, 9.4, 19.5),
                    &Data::new(3, 4.7, 15.5),
                    &Data::new(4, 3.4, 13.5),
                ],
            )
            .fixture(
                vec![call!(execute, select(Data::table()).filter(ge()))],
                [
                    &Data::new(5, 16.3, 3.5),
                    &Data::new(6, 19.3, 10.5),
                    &Data::new(7, 13.3, 33.7),
                ],
            ),
    );

    session
        .execute_with(
            insert(Data::table()),
            json!([
                {"pk1": 8, "data_p1": 16.3, "data_p2": 38.15, "name": "test9"},
                {"pk1": 9, "data_p1": 13.6, "data_p2": 33.5, "name": "test10"},
                {"pk1": 10, "data_p1": 10.1, "data_p2": 331.35, "name": "test11"},
                {"pk1": 1, "data_p1": 2.5, "data_p2": 67.1, "name": "test12"}
            ]),
        )
        .unwrap();
    session
        .execute_with(
            insert(Data::table()),
            json!([{"pk1": 11, "data_p1": 31.5, "data_p2": 67.1, "name": "test13"}]),
        )
        .unwrap();

    let names = |rows: &[Row]| -> Vec<String> {
        models::<Data>(rows)
            .into_iter()
            .map(|d| format!("{}{}", d.pk1, d.name.unwrap_or_default()))
            .collect()
    };
    let expected = ["8test9", "9test10", "10test11", "1test12", "11test13"];

    let rows = session.execute(select(Data::table())).unwrap().all();
    assert_eq!(names(&rows), expected);

    let n = session
        .execute(delete(Data::table()).filter(lt()))
        .unwrap()
        .rowcount();
    assert_eq!(n, 4);
    let n = session
        .execute(delete(Data::table()).filter(ge()))
        .unwrap()
        .rowcount();
    assert_eq!(n, 3);

    let rows = session
        .execute(select(Data::table()).filter(ge()))
        .unwrap()
        .all();
    assert!(rows.is_empty());
    let rows = session.execute(select(Data::table())).unwrap().all();
    assert_eq!(names(&rows), expected);
    let rows = session
        .execute(select(Data::table()).filter(lt()))
        .unwrap()
        .all();
    assert!(rows.is_empty());
}

#[test]
fn scalar_semantics() {
    let mut session = UnifiedSession::new();
    assert_eq!(
        session
            .execute(select(Entry::table()))
            .unwrap()
            .scalar()
            .unwrap(),
        None
    );

    session
        .execute(insert(Entry::table()).values(json!([{"pk1": 123, "name": "test"}])))
        .unwrap();
    let scalar = session
        .execute(select(Entry::table()))
        .unwrap()
        .scalar()
        .unwrap()
        .unwrap();
    let row = scalar.as_row().unwrap();
    assert_eq!(row.to_model::<Entry>().unwrap(), Entry::named(123, "test"));

    session
        .execute(insert(Entry::table()).values(json!({"pk1": 1234, "name": "test"})))
        .unwrap();
    let err = session
        .execute(select(Entry::table()))
        .unwrap()
        .scalar()
        .unwrap_err();
    assert!(err.is_multiple_results());
}

#[test]
fn scalar_unwraps_single_column() {
    let by_pk = || select(Entry::name()).filter(Entry::pk1().eq(3));
    let mut session = UnifiedSession::with_config(
        SessionConfig::new().fixture(vec![call!(execute, by_pk())], [Row::tuple(["test"])]),
    );
    let scalar = session.execute(by_pk()).unwrap().scalar().unwrap();
    assert_eq!(scalar, Some(Scalar::Value(Value::from("test"))));
}

#[test]
fn update_statement_edits_matched_rows() {
    let where_pk = |pk: i64| select(Entry::table()).filter(Entry::pk1().eq(pk));
    let mut session = UnifiedSession::with_config(
        SessionConfig::new().fixture(
            vec![call!(execute, where_pk(3))],
            [&Entry::named(1234, "test")],
        ),
    );

    let rows = session.execute(where_pk(3)).unwrap().all();
    assert_eq!(models::<Entry>(&rows), vec![Entry::named(1234, "test")]);

    let updated = session
        .execute(
            update(Entry::table())
                .filter(Entry::pk1().eq(5))
                .values(&json!({"pk1": 3})),
        )
        .unwrap()
        .rowcount();
    assert_eq!(updated, 0);
    let rows = session.execute(where_pk(3)).unwrap().all();
    assert_eq!(models::<Entry>(&rows)[0].pk1, 1234);

    let updated = session
        .execute(
            update(Entry::table())
                .filter(Entry::pk1().eq(3))
                .values(&json!({"pk1": 3})),
        )
        .unwrap()
        .rowcount();
    assert_eq!(updated, 1);
    let rows = session.execute(where_pk(3)).unwrap().all();
    assert_eq!(models::<Entry>(&rows)[0].pk1, 3);

    let deleted = session
        .execute(delete(Entry::table()).filter(Entry::pk1().eq(3)))
        .unwrap()
        .rowcount();
    assert_eq!(deleted, 1);
    assert!(session.execute(where_pk(3)).unwrap().all().is_empty());
}
