use rand::Rng;
use std::fmt::Write;

/// 32 바이트 난수를 hex 로 인코딩한 세션 토큰
/// 토큰 자체에는 사용자 정보가 없고 저장소 조회로만 식별된다.
pub fn issue() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
