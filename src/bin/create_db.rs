use tokio_postgres::NoTls;

/// Creates the directory database ahead of the first service start.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let conn_str = std::env::var("PG_ADMIN_CONN")
        .unwrap_or_else(|_| "host=127.0.0.1 user=postgres dbname=postgres".into());
    let db_name = std::env::var("DB_NAME").unwrap_or_else(|_| "childactor_directory".into());

    println!("Connecting to Postgres to manage databases...");

    let (client, connection) = tokio_postgres::connect(&conn_str, NoTls).await?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("connection error: {}", e);
        }
    });

    if !db_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(format!("invalid database name '{db_name}'").into());
    }

    let exists = client
        .query_opt("SELECT 1 FROM pg_database WHERE datname = $1", &[&db_name])
        .await?
        .is_some();

    if exists {
        println!("Database '{}' already exists.", db_name);
        return Ok(());
    }

    client
        .execute(format!("CREATE DATABASE \"{db_name}\"").as_str(), &[])
        .await?;
    println!("Database '{}' created. Migrations run on service start.", db_name);

    Ok(())
}
