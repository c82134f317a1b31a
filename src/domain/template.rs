//! Template Chapter Generator
//!
//! AI 不可用或失败时的兜底章节生成。纯函数，不会失败，输出永远非空。
//!
//! 分支只依赖两点：
//! - 章节号是否为 1（开篇模板 / 续写模板）
//! - 语言代码（目前只有 en、es 两套正文，其余回退到 en）

use super::generation::GenerationRequest;
use super::language::Language;

/// 模板输入
#[derive(Debug, Clone, Copy)]
pub struct TemplateInput<'a> {
    pub chapter_number: u32,
    pub characters: &'a str,
    pub setting: &'a str,
    pub genre: &'a str,
    pub prompt: Option<&'a str>,
    pub language_code: &'a str,
}

impl<'a> From<&'a GenerationRequest> for TemplateInput<'a> {
    fn from(req: &'a GenerationRequest) -> Self {
        Self {
            chapter_number: req.chapter_number.get(),
            characters: &req.characters,
            setting: &req.setting,
            genre: &req.genre,
            prompt: Some(req.prompt.as_str()),
            language_code: &req.language_code,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TemplateLanguage {
    English,
    Spanish,
}

impl TemplateLanguage {
    fn from_code(code: &str) -> Self {
        let lang = Language::resolve(code);
        match lang.code {
            "es" => TemplateLanguage::Spanish,
            _ => TemplateLanguage::English,
        }
    }
}

/// 为请求渲染兜底章节
pub fn template_chapter_for(request: &GenerationRequest) -> String {
    template_chapter(TemplateInput::from(request))
}

/// 渲染兜底章节
pub fn template_chapter(input: TemplateInput<'_>) -> String {
    let genre = input.genre.to_lowercase();
    let prompt = input.prompt.map(str::trim).filter(|p| !p.is_empty());
    let language = TemplateLanguage::from_code(input.language_code);

    let body = match (language, input.chapter_number <= 1) {
        (TemplateLanguage::English, true) => beginning_en(&input, &genre),
        (TemplateLanguage::English, false) => continuation_en(&input, &genre, prompt),
        (TemplateLanguage::Spanish, true) => beginning_es(&input, &genre),
        (TemplateLanguage::Spanish, false) => continuation_es(&input, &genre, prompt),
    };

    let direction = prompt
        .map(|p| format!("\n### Story Direction\n*{}*", p))
        .unwrap_or_default();

    format!(
        "{body}\n\n{direction}\n\n---\n\n*This is a template chapter. Edit this content to match your vision, or enable DeepSeek AI in settings for automated generation.*"
    )
}

/// 手动写作入口的占位章节
pub fn manual_template(request: &GenerationRequest) -> String {
    let n = request.chapter_number.get();
    let hint = if n == 1 {
        format!(
            "This is the beginning of your {} story featuring {} in {}.",
            request.genre.to_lowercase(),
            request.characters,
            request.setting
        )
    } else {
        "Continue your story from where the previous chapter left off.".to_string()
    };
    format!("Chapter {n}\n\nWrite your chapter content here...\n\n{hint}")
}

fn beginning_en(input: &TemplateInput<'_>, genre: &str) -> String {
    let n = input.chapter_number;
    let characters = input.characters;
    let setting = input.setting;
    format!(
        r#"# Chapter {n}: The Beginning

**{characters}** stood at the threshold of *{setting}*, their hearts racing with anticipation. This was the moment that would change everything - the beginning of their extraordinary {genre} adventure.

## The Journey Begins

The air around them seemed charged with possibility. Every shadow held mystery, every sound carried the promise of discovery. They had heard stories about this place, whispered tales that spoke of wonders and dangers in equal measure.

> "Are you ready for this?" one of them asked, their voice barely audible above the ambient sounds of {setting}.

The others exchanged glances, each seeing their own mixture of excitement and apprehension reflected in their companions' eyes. They had come too far to turn back now.

**"We've prepared for this moment our entire lives,"** came the determined reply. **"Whatever lies ahead, we'll face it together."**

As they took their first steps forward, the very air seemed to shimmer with magic and possibility. Their {genre} journey was about to begin, and none of them could imagine where it would lead."#
    )
}

fn continuation_en(input: &TemplateInput<'_>, genre: &str, prompt: Option<&str>) -> String {
    let n = input.chapter_number;
    let characters = input.characters;
    let setting = input.setting;
    let opening = match prompt {
        Some(p) => format!(
            "Following their current path - *{}* - they found themselves",
            p.to_lowercase()
        ),
        None => "They found themselves".to_string(),
    };
    format!(
        r#"# Chapter {n}: The Adventure Continues

The journey of **{characters}** through *{setting}* had taken unexpected turns, each more thrilling than the last. What had begun as a simple quest had evolved into something much more complex and meaningful.

## New Developments

{opening} facing challenges that tested not only their skills but their very understanding of the world around them.

The {genre} elements of their story continued to unfold in surprising ways. Ancient mysteries revealed themselves slowly, relationships deepened through shared trials, and the true scope of their adventure became clearer with each passing day.

> "Look how far we've come," one of them said, pausing to gaze back at the path they had traveled.

> "And yet," another replied thoughtfully, "I have the feeling our greatest challenges still lie ahead."

The wind carried whispers of distant places and untold stories, reminding them that their adventure was far from over. Each step forward brought new revelations, new allies, and new mysteries to unravel."#
    )
}

fn beginning_es(input: &TemplateInput<'_>, genre: &str) -> String {
    let n = input.chapter_number;
    let characters = input.characters;
    let setting = input.setting;
    format!(
        r#"# Capítulo {n}: El Comienzo

**{characters}** se encontraba en el umbral de *{setting}*, con el corazón acelerado por la expectación. Este era el momento que lo cambiaría todo: el comienzo de su extraordinaria aventura de {genre}.

## El Viaje Comienza

El aire a su alrededor parecía cargado de posibilidades. Cada sombra guardaba misterio, cada sonido llevaba la promesa del descubrimiento. Habían escuchado historias sobre este lugar, relatos susurrados que hablaban de maravillas y peligros a partes iguales.

> "¿Estás listo para esto?" preguntó uno de ellos, su voz apenas audible por encima de los sonidos ambientales de {setting}.

Los otros intercambiaron miradas, cada uno viendo su propia mezcla de emoción y aprensión reflejada en los ojos de sus compañeros. Habían llegado demasiado lejos para retroceder ahora.

**"Nos hemos preparado para este momento toda la vida,"** llegó la respuesta decidida. **"Pase lo que pase, lo enfrentaremos juntos."**

Mientras daban sus primeros pasos hacia adelante, el aire mismo parecía brillar con magia y posibilidad. Su viaje de {genre} estaba a punto de comenzar, y ninguno de ellos podía imaginar a dónde los llevaría."#
    )
}

fn continuation_es(input: &TemplateInput<'_>, genre: &str, prompt: Option<&str>) -> String {
    let n = input.chapter_number;
    let characters = input.characters;
    let setting = input.setting;
    let opening = match prompt {
        Some(p) => format!(
            "Siguiendo su camino actual - *{}* - se encontraron",
            p.to_lowercase()
        ),
        None => "Se encontraron".to_string(),
    };
    format!(
        r#"# Capítulo {n}: La Aventura Continúa

El viaje de **{characters}** a través de *{setting}* había tomado giros inesperados, cada uno más emocionante que el anterior. Lo que había comenzado como una búsqueda simple había evolucionado hacia algo mucho más complejo y significativo.

## Nuevos Desarrollos

{opening} enfrentando desafíos que ponían a prueba no solo sus habilidades, sino su comprensión misma del mundo que los rodeaba.

Los elementos de {genre} de su historia continuaban desarrollándose de maneras sorprendentes. Los misterios antiguos se revelaban lentamente, las relaciones se profundizaban a través de las pruebas compartidas, y el verdadero alcance de su aventura se volvía más claro con cada día que pasaba.

> "Mira qué tan lejos hemos llegado," dijo uno de ellos, deteniéndose para contemplar el camino que habían recorrido.

> "Y sin embargo," respondió otro pensativamente, "tengo la sensación de que nuestros mayores desafíos aún están por delante."

El viento llevaba susurros de lugares distantes e historias no contadas, recordándoles que su aventura estaba lejos de terminar. Cada paso hacia adelante traía nuevas revelaciones, nuevos aliados y nuevos misterios por desentrañar."#
    )
}
