use std::fmt;
use std::io::{self, Read};

use serde::de::DeserializeOwned;

use crate::error::FetchError;

/// 응답 본문. 한 번만 순회할 수 있는 바이트 청크의 지연 시퀀스다.
pub type ByteStream = Box<dyn Iterator<Item = io::Result<Vec<u8>>> + Send>;

const CHUNK_SIZE: usize = 64 * 1024;

pub struct HttpResponse {
    pub status: u16,
    pub content_length: Option<u64>,
    pub body: ByteStream,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 본문 전체를 하나의 버퍼로 모은다.
    pub fn collect_body(mut self) -> io::Result<Vec<u8>> {
        self.body.try_fold(Vec::new(), |mut acc, chunk| {
            acc.extend_from_slice(&chunk?);
            Ok(acc)
        })
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// GET 요청을 수행하는 전송 계층.
/// 실제 구현은 reqwest를 쓰고, 테스트에서는 스크립트된 가짜를 쓴다.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

/// `Read`를 고정 크기 버퍼 단위의 청크 반복자로 바꾼다.
pub struct ByteChunks<R> {
    reader: R,
    buf: Vec<u8>,
    done: bool,
}

impl<R: Read> ByteChunks<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buf: vec![0; chunk_size],
            done: false,
        }
    }
}

impl<R: Read> Iterator for ByteChunks<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.reader.read(&mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(n) => return Some(Ok(self.buf[..n].to_vec())),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, FetchError> {
        // No overall timeout: a media transfer can legitimately take minutes.
        let client = reqwest::blocking::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .timeout(None)
            .build()
            .map_err(|e| FetchError::network("-", e))?;

        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        tracing::debug!("GET {}", url);
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::network(url, e))?;

        Ok(HttpResponse {
            status: resp.status().as_u16(),
            content_length: resp.content_length(),
            body: Box::new(ByteChunks::new(resp, CHUNK_SIZE)),
        })
    }
}

/// GET 요청 후 JSON 본문을 `T`로 파싱한다.
/// 성공이 아닌 상태나 연결 실패는 `Network`, 잘못된 JSON은 `Parse`로 실패한다.
pub fn fetch_json<T: DeserializeOwned>(
    transport: &dyn Transport,
    url: &str,
) -> Result<T, FetchError> {
    let resp = transport.get(url)?;
    if !resp.is_success() {
        return Err(FetchError::network(url, format!("HTTP {}", resp.status)));
    }
    let body = resp
        .collect_body()
        .map_err(|e| FetchError::network(url, e))?;
    Ok(serde_json::from_slice(&body)?)
}
