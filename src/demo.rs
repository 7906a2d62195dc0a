//! Walkthrough of the record layer: create, list, update, delete, undo.

use anyhow::{Context, Result};
use tabula_db::{Column, Record, Repository, Session, Store, TableDef};

/// The `users` table the walkthrough operates on.
pub fn users_table() -> TableDef {
    TableDef::new("users")
        .column(Column::integer("id").primary_key())
        .column(Column::string("name", 50).not_null())
        .column(Column::string("email", 100).not_null())
}

/// Run the walkthrough against `store` and return the printed transcript.
pub fn run_demo(store: &Store, json: bool) -> Result<Vec<String>> {
    let table = users_table();
    table.create_in(store).context("Failed to create users table")?;

    let conn = store.connect()?;
    let mut out = Vec::new();
    {
        let repo = Repository::new(&table);
        let mut session = Session::new(&conn);

        let mut ala = Record::new(&table)
            .with("name", "Ala".to_string())?
            .with("email", "a@a.com".to_string())?;
        repo.save(&mut session, &mut ala)?;

        let mut ewa = Record::new(&table)
            .with("name", "Ewa".to_string())?
            .with("email", "w@w.com".to_string())?;
        repo.save(&mut session, &mut ewa)?;
        tracing::info!("Saved users {:?} and {:?}", ala.id(), ewa.id());

        out.push("Select names:".to_string());
        let names = repo.select(&mut session, &["name"]).execute()?;
        out.extend(render(&names, json));

        out.push("Select everything:".to_string());
        list_all(&repo, &mut session, json, &mut out)?;

        ala.set("email", "alice@gmail.com".to_string())?;
        repo.save(&mut session, &mut ala)?;
        out.push("After changing Ala's email:".to_string());
        list_all(&repo, &mut session, json, &mut out)?;

        repo.delete(&mut session, ala)?;
        out.push("After deleting Ala:".to_string());
        list_all(&repo, &mut session, json, &mut out)?;

        // The listing above ran a read, which sits on top of the delete.
        session.undo_last()?;
        session.undo_last()?;
        out.push("After undoing the delete:".to_string());
        list_all(&repo, &mut session, json, &mut out)?;
    }
    store.release(conn);

    Ok(out)
}

fn list_all(
    repo: &Repository<'_>,
    session: &mut Session<'_>,
    json: bool,
    out: &mut Vec<String>,
) -> Result<()> {
    let records = repo.select(session, &[]).execute()?;
    out.extend(render(&records, json));
    Ok(())
}

fn render(records: &[Record<'_>], json: bool) -> Vec<String> {
    records
        .iter()
        .map(|r| {
            if json {
                r.to_json().to_string()
            } else {
                r.to_string()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_follows_each_stage() {
        let store = Store::in_memory(2).unwrap();
        let out = run_demo(&store, false).unwrap();

        assert_eq!(
            out,
            [
                "Select names:",
                "users(name='Ala')",
                "users(name='Ewa')",
                "Select everything:",
                "users(id=1, name='Ala', email='a@a.com')",
                "users(id=2, name='Ewa', email='w@w.com')",
                "After changing Ala's email:",
                "users(id=1, name='Ala', email='alice@gmail.com')",
                "users(id=2, name='Ewa', email='w@w.com')",
                "After deleting Ala:",
                "users(id=2, name='Ewa', email='w@w.com')",
                "After undoing the delete:",
                "users(id=1, name='Ala', email='alice@gmail.com')",
                "users(id=2, name='Ewa', email='w@w.com')",
            ]
        );
        assert_eq!(store.status().available, 2);
    }

    #[test]
    fn json_rendering() {
        let store = Store::in_memory(1).unwrap();
        let out = run_demo(&store, true).unwrap();
        assert_eq!(out[1], r#"{"name":"Ala"}"#);
    }
}
