//! Method negotiation.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::socks::{read_field, ProtocolError, AUTH_NO_AUTH, SOCKS_VERSION};

/// Run the SOCKS5 greeting and accept "no authentication".
///
/// The reply is `[0x05, 0x00]` whatever the client offered. Returns the
/// methods the client listed. Nothing is written when the version is wrong.
pub async fn handshake<S>(stream: &mut S) -> Result<Vec<u8>, ProtocolError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut header = [0u8; 2];
    read_field(stream, &mut header, "greeting").await?;

    let [version, method_count] = header;
    if version != SOCKS_VERSION {
        return Err(ProtocolError::UnsupportedVersion(version));
    }

    let mut methods = vec![0u8; method_count as usize];
    read_field(stream, &mut methods, "auth methods").await?;

    stream.write_all(&[SOCKS_VERSION, AUTH_NO_AUTH]).await?;
    Ok(methods)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socks::AUTH_USERNAME_PASSWORD;
    use tokio::io::{duplex, AsyncReadExt};

    #[tokio::test]
    async fn accepts_no_auth() {
        let (mut client, mut server) = duplex(64);
        client.write_all(&[0x05, 0x01, 0x00]).await.unwrap();

        let methods = handshake(&mut server).await.unwrap();
        assert_eq!(methods, vec![AUTH_NO_AUTH]);

        let mut reply = [0u8; 2];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply, [0x05, 0x00]);
    }

    #[tokio::test]
    async fn always_answers_no_auth() {
        let (mut client, mut server) = duplex(64);
        client
            .write_all(&[0x05, 0x01, AUTH_USERNAME_PASSWORD])
            .await
            .unwrap();

        handshake(&mut server).await.unwrap();

        let mut reply = [0u8; 2];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply, [0x05, 0x00]);
    }

    #[tokio::test]
    async fn wrong_version_writes_nothing() {
        let (mut client, mut server) = duplex(64);
        client.write_all(&[0x04, 0x01, 0x00]).await.unwrap();

        let err = handshake(&mut server).await.unwrap_err();
        assert!(matches!(err, ProtocolError::UnsupportedVersion(0x04)));

        drop(server);
        let mut written = Vec::new();
        client.read_to_end(&mut written).await.unwrap();
        assert!(written.is_empty());
    }

    #[tokio::test]
    async fn short_method_list_is_truncated() {
        let (mut client, mut server) = duplex(64);
        client.write_all(&[0x05, 0x03, 0x00]).await.unwrap();
        drop(client);

        let err = handshake(&mut server).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Truncated("auth methods")));
    }

    #[tokio::test]
    async fn empty_stream_is_truncated() {
        let (client, mut server) = duplex(64);
        drop(client);
        let err = handshake(&mut server).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Truncated("greeting")));
    }
}
