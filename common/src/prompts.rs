//! プロンプト生成モジュール
//!
//! タスクごとに変わるのは名前の呼び方（プレイヤー名 / キャラクター名）だけで、
//! それ以外のルールは共通。

/// 遠征入力で使う名前の呼び方
pub const PLAYER_NOUN: &str = "プレイヤー名";

/// 探索入力で使う名前の呼び方
pub const CHARACTER_NOUN: &str = "キャラクター名";

/// 抽出プロンプト生成
///
/// # Arguments
/// * `noun` - 名前の呼び方（例: "プレイヤー名"）
///
/// # Returns
/// Vision APIに画像と一緒に渡すプロンプト文字列
pub fn build_extraction_prompt(noun: &str) -> String {
    format!(
        r#"あなたは、与えられたゲームのスクリーンショット画像を直接解析する、超高精度のデータ抽出AIです。
あなたの使命は、画像の中から「{noun}」と「スコア」のペアだけを完璧に抽出し、指定された形式で出力することです。

#厳格なルール
1. 画像を直接、あなたの目で見て、文字を認識してください。
2. 認識した文字の中から、「{noun}」と、その右側あるいは下の行にある「数値（スコア）」のペアのみを抽出対象とします。
3. 画像に含まれる「ギルド対戦」「ラウンド」「<」「>」「|S」「A」のような、UIテキスト、無関係な記号、ランクを示すアルファベットは、思考の過程から完全に除外してください。
4. {noun}は、日本語、英語、数字が混在することがあります（例: `korosuke94`, `あーる 0113`）。また、数字のみの場合もあります（例: `3666666666666663`）。これらも、一つの名前として正しく認識してください。
5. 最終的なアウトプットは、一行につき「名前,数値」の形式で、カンマ区切りで出力してください。
6. いかなる場合でも、ルールに記載された以外の説明、前置き、後書きは、絶対に出力しないでください。

#補足
同じ{noun}が重複している場合があります。混乱する必要はありませんので、上記のルールに従ってください。"#
    )
}
