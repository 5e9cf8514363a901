//! End-to-end client/server sessions over the in-process transport.

use rcon_client::{Client, ClientError};
use rcon_protocol::MAX_RESPONSE_BODY;
use rcon_server::{CommandError, CommandRegistry, FnHandler, Server, ServerConfig};

fn test_server(password: &str) -> Server {
    let mut commands = CommandRegistry::new();
    commands.register("status", FnHandler::new(|_: &[&str]| Ok("ok".to_string())));
    commands.register("echo", FnHandler::new(|args: &[&str]| Ok(args.join(" "))));
    commands.register(
        "dump",
        FnHandler::new(|_: &[&str]| Ok("z".repeat(MAX_RESPONSE_BODY * 2 + 17))),
    );
    commands.register(
        "kick",
        FnHandler::with_usage("<player>", |args: &[&str]| {
            if args.is_empty() {
                Err(CommandError::Usage)
            } else {
                Ok(format!("kicked {}", args[0]))
            }
        }),
    );
    Server::new(ServerConfig::default().with_password(password), commands)
}

#[tokio::test]
async fn test_authenticate_and_execute() {
    let server = test_server("Test1234");
    let mut client = Client::local(server.attach_local());

    client.authenticate("Test1234").await.unwrap();
    assert!(client.is_authenticated());

    let reply = client.execute("status").await.unwrap();
    assert_eq!(reply, "ok");

    let reply = client.execute("echo hello world").await.unwrap();
    assert_eq!(reply, "hello world");

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_wrong_password_is_denied() {
    let server = test_server("Test1234");
    let mut client = Client::local(server.attach_local());

    let result = client.authenticate("wrong").await;
    assert!(matches!(result, Err(ClientError::AuthenticationDenied)));
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_reconnect_requires_reauthentication() {
    let server = test_server("Test1234");

    let mut client = Client::local(server.attach_local());
    client.authenticate("Test1234").await.unwrap();
    client.close().await.unwrap();

    // A fresh connection starts unauthenticated again.
    let mut client = Client::local(server.attach_local());
    let result = client.execute("status").await;
    assert!(matches!(result, Err(ClientError::NotAuthenticated)));

    client.authenticate("Test1234").await.unwrap();
    assert_eq!(client.execute("status").await.unwrap(), "ok");
}

#[tokio::test]
async fn test_repeated_authentication_is_acknowledged() {
    let server = test_server("Test1234");
    let mut client = Client::local(server.attach_local());

    client.authenticate("Test1234").await.unwrap();
    client.authenticate("Test1234").await.unwrap();
    assert_eq!(client.execute("status").await.unwrap(), "ok");
}

#[tokio::test]
async fn test_unknown_command_text() {
    let server = test_server("Test1234");
    let mut client = Client::local(server.attach_local());

    client.authenticate("Test1234").await.unwrap();
    let reply = client.execute("bogus").await.unwrap();
    assert_eq!(reply, "Error: No such command or configuration variable.");
}

#[tokio::test]
async fn test_usage_error_text() {
    let server = test_server("Test1234");
    let mut client = Client::local(server.attach_local());

    client.authenticate("Test1234").await.unwrap();
    let reply = client.execute("kick").await.unwrap();
    assert_eq!(reply, "Usage: kick <player>");

    let reply = client.execute("kick steve").await.unwrap();
    assert_eq!(reply, "kicked steve");
}

#[tokio::test]
async fn test_oversized_response_is_reassembled() {
    let server = test_server("Test1234");
    let mut client = Client::local(server.attach_local());

    client.authenticate("Test1234").await.unwrap();
    let reply = client.execute("dump").await.unwrap();
    assert_eq!(reply, "z".repeat(MAX_RESPONSE_BODY * 2 + 17));
}

#[tokio::test]
async fn test_empty_command_yields_empty_response() {
    let server = test_server("Test1234");
    let mut client = Client::local(server.attach_local());

    client.authenticate("Test1234").await.unwrap();
    let reply = client.connection().execute("").await.unwrap();
    assert_eq!(reply, None);
}

#[tokio::test]
async fn test_server_without_password_rejects() {
    let server = Server::new(ServerConfig::default(), CommandRegistry::new());
    let mut client = Client::local(server.attach_local());

    let result = client.authenticate("anything").await;
    assert!(matches!(result, Err(ClientError::AuthenticationDenied)));
}
