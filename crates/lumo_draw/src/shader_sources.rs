//! Embedded shader sources
//!
//! Each built-in shader ships as WGSL text, LZ4-block compressed
//! (decompressed size prepended) and base64 encoded. The plain sources live
//! under `shaders/`; `tools/encode_shaders.py` regenerates the blobs and a
//! unit test keeps them byte-identical to the files. Decoding feeds the
//! portable shader loader: base64 -> LZ4 -> UTF-8 -> parse -> validate.

use base64::Engine;
use lumo_gpu::Shader;

/// `vertex.wgsl` (797 bytes, 0.62x)
const VERTEX_LZ4_B64: &str = "HQMAAPBYLy8gU2hhcmVkIHZlcnRleCBzdGFnZSBmb3IgZXZlcnkgbm9uLXN0ZW5jaWwgZHJh\
     dy4gUG9zaXRpb25zIGFycml2ZSBpbiBjbGlwCi8vIHNwYWNlOyB0aGUgbWFzayBVViBpcyBk\
     ZSgAYGQgZnJvbRwA8gJtIHNvIGFsbCBmcmFnbWVudHYAwHMgY2FuIHNhbXBsZU0AAEYAAFkA\
     AksA1HdpdGhvdXQgZXh0cmGuAPEAZGF0YS4KCnN0cnVjdCBWwwDwAklucHV0IHsKICAgIEBs\
     b2NhrQBTKDApIHC5AMs6IHZlYzI8ZjMyPiwmAL8xKSB0ZXhjb29yZCYACIEyKSBjb2xvciMA\
     EzRJABt9hwA3T3V0iACEYnVpbHRpbiiEAAuOAARFAA20AABGATFfdXZqAA+zAAkPJAALD7EA\
     BRJA9QH4AApmbiB2c19tYWluKGluOkgBQykgLT4QAAnRAHR2YXIgb3V0LAACHAARO04BQ291\
     dC63AHQgPSAoaW4u9QAmICt6AecoMS4wLCAtMS4wKSkgKhgApjAuNSwgLTAuNSlPAMR0ZXhf\
     dXYgPSBpbi6gAQYeAAGMAQIdAAELAAYaAAV5ABA9YQACZQEIkQAwLCAwhgAAhQACNQDgcmV0\
     dXJuIG91dDsKfQo=";

/// `stencil.wgsl` (340 bytes, 0.82x)
const STENCIL_LZ4_B64: &str = "VAEAAPAqLy8gU3RlbmNpbC1vbmx5IHBpcGVsaW5lOiBhY2N1bXVsYXRlcyB3aW5kaW5nIGNv\
     dW50cywgd3JpFwDzAW5vIGNvbG9yICh0aGUKLy8OAPIOdGFyZ2V0IGlzIGJvdW5kIHdpdGgg\
     YW4gZW1wdHk8APAeIG1hc2spLgoKQHZlcnRleApmbiB2c19tYWluKEBsb2NhdGlvbigwKSBw\
     b3NpDAD0CjogdmVjMjxmMzI+KSAtPiBAYnVpbHRpbighABApIQARNCEA1iB7CiAgICByZXR1\
     cm4XAAUrAPAKLCAwLjAsIDEuMCk7Cn0KCkBmcmFnbWVudIYAE2aGAAJmAAiLAD92ZWNgAAuA\
     MC4wKTsKfQo=";

/// `vertex_color.wgsl` (421 bytes, 0.71x)
const VERTEX_COLOR_LZ4_B64: &str = "pQEAAPAtLy8gVmVydGV4IGNvbG9yLCBnYXRlZCBieSB0aGUgY2xpcCBtYXNrLgoKQGdyb3Vw\
     KDApIEBiaW5kaW5nDAAxdmFyIQCjX3RleHR1cmU6IAkAn18yZDxmMzI+OzkAATUxKSA5AJNz\
     YW1wbGVyOiAJAPAXOwoKQGZyYWdtZW50CmZuIGZzX21haW4oCiAgICBAbG9jYXRpb258AACZ\
     AJFfdXY6IHZlYzJtABssJQAgMSmPAA8kAAsiMin7AAFHABM0RwBKKSAtPm0AMnZlYx0AISB7\
     ZQAgaWZbAADzABFTwQARKI4AA/0AEiwUAQPSAAMOAMN1dikuciA8PSAwLjBFAADTAIFkaXNj\
     YXJkO1YAEX0GAPABcmV0dXJuIGNvbG9yOwp9Cg==";

/// `image.wgsl` (611 bytes, 0.60x)
const IMAGE_LZ4_B64: &str = "YwIAAPcgLy8gVGV4dHVyZWQgZHJhdyB0aW50ZWQgYnkgdGhlIHZlcnRleCBjb2xvciwgZ2Eb\
     APAPY2xpcCBtYXNrLgoKQGdyb3VwKDApIEBiaW5kaW5nDAAxdmFyIQAiX3RiACM6IAkAn18y\
     ZDxmMzI+OzkAATUxKSA5AJNzYW1wbGVyOiAJAA8xAAISMjEAX2ltYWdlawAbGDM6AANjAAds\
     APAVCkBmcmFnbWVudApmbiBmc19tYWluKAogICAgQGxvY2F0aW9u6AAABQGRX3V2OiB2ZWMy\
     2QAbLCUAIDEp+wAPJAALIjIpZwEBRwATNEcASikgLT5tADJ2ZWMdACEge2UAIGlmWwAAwQER\
     Uy0BESiOAANpARIsgAED2wADDgDDdXYpLnIgPD0gMC4wRQAA0wCBZGlzY2FyZDtWABF9BgBr\
     cmV0dXJuYAAJaAEiLCAPAAViAPAEdGV4X3V2KSAqIGNvbG9yOwp9Cg==";

/// `rc_image.wgsl` (666 bytes, 0.60x)
const RC_IMAGE_LZ4_B64: &str = "mgIAAPBJLy8gU2luZ2xlLWNoYW5uZWwgKHJlZCkgdGV4dHVyZSB1c2VkIGFzIGNvdmVyYWdl\
     LCBmb3IgZ2x5cGggYXRsYXNlcy4KCkBncm91cCgwKSBAYmluZGluZwwAk3ZhciBtYXNrX00A\
     FDpWAJ9fMmQ8ZjMyPjs5AAE1MSkgOQCTc2FtcGxlcjogCQAPMQACEjIxAF9pbWFnZWsAGxgz\
     OgADYwAHbADwFQpAZnJhZ21lbnQKZm4gZnNfbWFpbigKICAgIEBsb2NhdGlvbugAAeQAgXV2\
     OiB2ZWMy2QAbLCUAETFRAR9fJAAKgTIpIGNvbG9yRwATNEcASikgLT5tADJ2ZWMdACEge2UA\
     JGlmVgERUy0BESiOAANyARIsgAED2wADDgDDdXYpLnIgPD0gMC4wRQAA0wCBZGlzY2FyZDtW\
     ABF9BgA1bGV0+QErID1oAAlwASIsIA8ABWoAQXRleF9pAAJQAGByZXR1cm4hAQK9ABEo6wBW\
     LnJnYixiABIqAQFwLmEpOwp9Cg==";

/// `resolve_mask.wgsl` (900 bytes, 0.65x)
const RESOLVE_MASK_LZ4_B64: &str = "hAMAAPE0Ly8gQ29tYmluZXMgdGhlIGFjdGl2ZSBjbGlwIG1hc2sgd2l0aCBhIGxheWVyJ3Mg\
     YWxwaGEgaW50byBhIG5ldyByOCgA8wYuCi8vIFRoZSB2ZXJ0ZXggY29sb3IuAFNjYXJyaWAA\
     AUgA8Qsgb3BhY2l0eTsgYGludmVyc2VgIHNlbGVjdIUAAEsA0WNvbXBsZW1lbnQgb2aaAAI6\
     APMXY292ZXJhZ2UuCgpzdHJ1Y3QgUmVzb2x2ZVBhcmFtcyB7CiAgICBWAPEPOiBmMzIsCn0K\
     CnZhcjxwdXNoX2NvbnN0YW50PiBwMQAaOkAA8AY7CgpAZ3JvdXAoMCkgQGJpbmRpbmcMADF2\
     YXLoAKNfdGV4dHVyZTogCQCfXzJkPGYzMj47OQABNTEpIDkAIHNh0gAzcjogCQAPMQACEjIx\
     AF9pbWFnZWsAGxgzOgADYwAHbABgCkBmcmFnUAHBCmZuIGZzX21haW4oLQGQQGxvY2F0aW9u\
     6AAA9AGRX3V2OiB2ZWMy2QAbLCUAIDEp+wAPJAALIjIpAQIBRwATNEcAWSkgLT4gbQAydmVj\
     HQADtwExbGV0ZQEgID1jAABnARFTNQERKJYAA3EBESwjABNf4wADDgBhdXYpLnI7qgAARQAC\
     LAIMRgAJVgEiLCAPAAVIAEB0ZXhfRwAyYSAqvQAmLmFRAAR3AnEgPSBtaXgoYAByLCAxLjAg\
     LRsDEyxQAhMuewISKTwAYHJldHVybk0BAukAAcoAAWEAsHZlcmFnZSk7Cn0K";

/// `color_matrix.wgsl` (1185 bytes, 0.59x)
const COLOR_MATRIX_LZ4_B64: &str = "oQQAAPBWLy8gNHg1IGFmZmluZSBjb2xvciB0cmFuc2Zvcm0uIFRoZSBwdXNoIGNvbnN0YW50\
     IGNhcnJpZXMgdGhlIDIwIHJvdy1tYWpvcgovLyBjb2VmZmljaWVudHMgKFIsIEcsIEIsIEEm\
     APAecyBvZiBmb3VyIG11bHRpcGxpZXJzIHBsdXMgb25lIGFkZGl0aXZlIHRlcm0pTQDQcGFj\
     a2VkIGludG8gZhoA8AF2ZWM0cy4KCnN0cnVjdCBDrADwCE1hdHJpeFBhcmFtcyB7CiAgICBj\
     MDogKwBiPGYzMj4sEwAeMRMAHjITAB4zEwAZNBMAcH0KCnZhcjwRARRfEQExPiBwfgAeOpEA\
     8AY7CgpAZ3JvdXAoMCkgQGJpbmRpbmcMAPMEdmFyIGltYWdlX3RleHR1cmU6IAkAMV8yZLgA\
     Hzs6AAE2MSkgOgCTc2FtcGxlcjogCQAAbQDxBWZyYWdtZW50CmZuIGZzX21haW4oAQGQQGxv\
     Y2F0aW9ufgBxbWFza191dtoAETJuAAImAQYlACAxKZAADyQACyIyKS4CAUcAEzRHAFYpIC0+\
     IEgAJjApigEDngFwbGV0IHAgPWAAAPkAEVPGABkoDQETLBwBA9kAECwsAGJfdXYpICpyABE7\
     0wBQLy8gVW4kAgGKAgWHAgHOAgmIAkFmcm9tJAAAFQIQIDIAQWluZy5EAACNAKZyID0gZG90\
     KHAsrAASKNMBYy5jMC54LOABAA0AGHkNABh6DQBVdykpICsqADIxLnilAABhAB9nYQAJJzEu\
     VAAnMS5UADYxLndhADkyLnhhADYyLnlhAB9iYQAJGDJUABgyVAAYM9wAOTMueWEANjMuemEA\
     H2FhAAkYM1QAGDRUABg03AA5NC56YQAyNC53YQBncmV0dXJufAHwAHIsIGcsIGIsIGEpOwp9\
     Cg==";

/// `blur.wgsl` (1142 bytes, 0.55x)
const BLUR_LZ4_B64: &str = "dgQAAPBaLy8gU2VwYXJhYmxlIDktdGFwIEdhdXNzaWFuIGJsdXI7IG9uZSBwYXNzIHBlciBh\
     eGlzLCBkaXJlY3Rpb24gaW4gdGV4ZWxzLgoKc3RydWN0IEJsdXJQYXJhbXMgewogICAgcmVz\
     b2x1LwDBOiB2ZWMyPGYzMj4sGwAFSQAJGgDwB30KCnZhcjxwdXNoX2NvbnN0YW50PiClADdt\
     czpgAPAGOwoKQGdyb3VwKDApIEBiaW5kaW5nDADwA3ZhciBpbWFnZV90ZXh0dXJlOqYAAAkA\
     MV8yZH8AHzs6AAE2MSkgOgCTc2FtcGxlcjogCQAAbQDxBWZyYWdtZW50CmZuIGZzX21haW4o\
     yABQQGxvY2HiAAB+AHltYXNrX3V20wAACAEGJQAgMSmQAA8kAAuBMikgY29sb3JHABE0tQB2\
     LAopIC0+IEgAIDApUQECHQADbQGjbGV0IHN0ZXAgPTEBFS5kAXIgLyBtYXgoSAEWLpYBECxF\
     AAKWAXEoMS4wKSk71ACiLy8gTGluZWFyLQIBFWQZApI6IHR3byB0YXAUAlBzaWRlIKUBEGQP\
     AoBmb3IgZm91cuIAARgCAPsAAJYAkm9mZnNldDEgPaAAoiogMS4zODQ2MTVvAAYjABYyIwCC\
     My4yMzA3NjkjAACdAYByZXN1bHQgPV8AANEBEVOnARko7gETLP0BArgAIHIsLADyAF91dikg\
     KiAwLjIyNzAyN1EAA00AHytOACEzICsg0gACWABvMzE2MjE2WAAwHy1YAEQEsAASMrAAEDAH\
     AR8wsAA4D1gAAkB0dXJuAQQAtAGwKiBjb2xvcjsKfQo=";

/// `blend.wgsl` (4714 bytes, 0.48x)
const BLEND_LZ4_B64: &str = "ahIAAPElLy8gVHdvLXBhc3MgYmxlbmQtbW9kZSBjb21wb3NpdGluZy4gU2FtcGxlcyB0aGUg\
     cHJlLSgAsCBzb3VyY2UgYW5kGQDzBAovLyBiYWNrZHJvcCwgYXBwbGkyADhXM0NPAPAHIGZv\
     cm11bGEgc2VsZWN0ZWQgYnkgYHUAIGAsTQAASQBDd3JpdD4AkHJlc3VsdCB0b2UABUgAwGVk\
     IHRhcmdldC4gTa8A4G51bWJlcnMgZm9sbG93KwAARwAQQtAAASAA8AJyYXcgdmFsdWVzOyBv\
     bmx5IHAA8BZzIHdpdGhvdXQgYSBmaXhlZC1mdW5jdGlvbiBlcXVpdmFsZW50SADxDHJlYWNo\
     IHRoaXMgc2hhZGVyLgoKc3RydWN0IGMAwVBhcmFtcyB7CiAgIFoAYTogdTMyLA8AoG9wYWNp\
     dHk6IGYSAPEIfQoKdmFyPHB1c2hfY29uc3RhbnQ+IHBAABg6TQDwBjsKCkBncm91cCgwKSBA\
     YmluZGluZwwAM3ZhcnoBo190ZXh0dXJlOiAJAJ9fMmQ8ZjMyPjs7AAE3MSkgOwARc9IBM3I6\
     IAkADzMAAhIyMwAE1gEPcAAbGzM9AANpAAdyAPEACmZuIGx1bShjOiB2ZWMzuwBAKSAtPioB\
     A0wB1nJldHVybiBkb3QoYywmAKAoMC4zLCAwLjU5BgCAMTEpKTsKfQpQAK5jbGlwX2NvbG9y\
     VwAFZQADXQBybGV0IGwgPYQAISk7rgEAFADDbiA9IG1pbihjLnIsCQBgZywgYy5iZwAA4gEA\
     JQAQeCUAI2F4JQABCQAKJQAAbQEAWwIyPSBjWwCjaWYgbiA8IDAuMIAAAEsAAiIAUGwgKyAo\
     CwDzAi0gbCkgKiBsIC8gKGwgLSBulwARfZ0Aj2lmIHggPiAxQgAQECglAAFOAFAvICh4IAoA\
     AoYAAkoAA1gBNG91dDkBTHNldF+NATEsIGy3AgGVAQw+AQNDAAhxAQDGAAC2AAFIABApLgEC\
     lQE+c2F0jgEzZjMyCAEDSgARbUUBAHMBAQkABE4BIyAthAEAGgABlgEEGgAIuwAMYwA/LCBz\
     uwAHAMABH23mARIfbecBDkBpZiBtlQEjbW7OAADWAQPSACAoY70AEG7SARBz0gEQbYkBGm3U\
     AQMrAAVeAUUoMC4wzgLXaGFyZF9saWdodChjYiYDRywgY3MPAA+gAQIB5QDwA3VsdGlwbHkg\
     PSAyLjAgKiBjcwUAEmILAgAiAFBzY3JlZQsBAjACAiYAAz0CIGNzugAEDQATYosCA7EAAr0F\
     EihAADMsIG1qAACaADkgPD2rAxc1CgI/b2Z00QApM2QgPTcGESgSAwBtATBzcXIfARIpbwUA\
     EgBCKCgxNu8AgGIgLSAxMi4wyQBkY2IgKyA0DAAGLgAsY2KxACMyNU0AA/MAACkBgGRhcmsg\
     PSBjUgADEwECLQECJgFTY2IgKiAYABRjKwEAOAABvgECOQA0KyAoMwAAlwACigBVKGQgLSAy\
     AApdAQE8ACAsIHsAD1gBDAHyBG9fZG9kZ2UqAh8KdQAFWAEAAwUGlwJQMS4wKSz/ACAvIKkD\
     Ai8CKGNzlQVjMWUtNikpOwEAiAEGPgAA1QIPcgEJEzA2AAX6AgLRAE9idXJu0AA2ArMAD9YA\
     AQa4ARIg3gAP2AAWARYBBTIBSGNiID77AgYeAAXYAAE6CQOhBgCDCAIpCB8g3gMeYXN3aXRj\
     aGwIB3gEs2Nhc2UgMXU6IHsg1QEBmAJQY3M7IH2RAQ8EAAUlLy/BAwbNAABMABsyTAAQK0IE\
     ALACAEcED1YAAzIvLyAVBApKABgzSgAI2AQQc1YCHymhAAGqLy8gb3ZlcmxheUsAGDRLAADQ\
     ASBjYh8DD0QAAgPyACEvL0YDKmVuSgAZNUoAAHcGD0oAEQGXAwxLABg2SwACvgIEjwMPnQAF\
     MS8vICkAEES3AwqZAB43TgADDAMPTQAFFCBOADtCdXLmABg4TQAYc4IFD00ACQApABBMewYK\
     mgAYOU0ACMgBDzoBBzAvLyApAA9NAAAoMTBOAEFhYnMoYAUvY3PMAQcAygGaaWZmZXJlbmNl\
     mwAcMfoCA64CA3UFAKIFDAoDuy8vIGV4Y2x1c2lvNQEZMfsCBB4JAAgAAWsIMXMsIAgAQmIp\
     KSxBCgAeCiAgfYcBLGh1mQAJ/QIARAAAIgkACAACRAADTAAfc0wAAGBzYXR1cmGTDAvsAAkF\
     AwBLAABTAAC4BAEIAAONAAP+AgIHAAQhAgtJAAkEAwVJABNi1gAucymLASAvL/IAIGluHw4L\
     mwMZMgcDACkGCwQGAEIGA5cBAB4FAPcD1S8vIHBsdXNEYXJrZXKdAHhkZWZhdWx0ywQPcAQD\
     At0ABQYAkS8vIG5vcm1hbEoAEH0XDGBAZnJhZ23LDaJmbiBmc19tYWluPwhBQGxvY10BAFkN\
     cW1hc2tfdXZYCREyjQwCsgYGJQAgMSlqDQ8kAAsiMinVAwFHABM0RwABoQkGSAAgMCkgCQId\
     AAO+BQArCFBzcmMgPWIAANUNAnMPEihkDwR6DRQs+g0DTQ0QLC4AOF91dqgILXN0RQAMwQ0V\
     LKkPHl9JAAE4ASNpZpQOEC6lBpAgPT0gMTZ1IHveAkZjbGVhpwEDZwYydmVjzwADvwoAjwEh\
     fQpLAADaACBjc7gJV3JjLnJnfAqKY2IgPSBkc3QWAGRhbHBoYV8xABBhaQYAzw0QLgoAAigP\
     Ey5TDwbGCgI0AARPACJhO3oAUy8vIEIoHAYwIHdlzAQCbRAAxxAEFAEgIGNkBkBhZ2UsNRAT\
     bmEBEC0VAAG/AAE2AwILETFlZC4TAADSABBtLxAAAw4waXgodgMI2AcDpgAAOgEA3AYBZQUj\
     LCCkAAerAQISADNvID0cADNzICsKAACrBAOVCAIlABdzNwAzcHJlbgsgaWUQCwKLABMqOwAA\
     RQAB9QcCOQAPSgAGI2lmMQAQb/4KCpUOD9UBCgDbAQ0hAAqUABQvWwAE9gBgbyk7Cn0K";

pub(crate) const SHADER_NAMES: &[&str] = &[
    "vertex",
    "stencil",
    "vertex_color",
    "image",
    "rc_image",
    "resolve_mask",
    "color_matrix",
    "blur",
    "blend",
];

fn encoded_source(name: &str) -> Option<&'static str> {
    Some(match name {
        "vertex" => VERTEX_LZ4_B64,
        "stencil" => STENCIL_LZ4_B64,
        "vertex_color" => VERTEX_COLOR_LZ4_B64,
        "image" => IMAGE_LZ4_B64,
        "rc_image" => RC_IMAGE_LZ4_B64,
        "resolve_mask" => RESOLVE_MASK_LZ4_B64,
        "color_matrix" => COLOR_MATRIX_LZ4_B64,
        "blur" => BLUR_LZ4_B64,
        "blend" => BLEND_LZ4_B64,
        _ => return None,
    })
}

/// Decodes one embedded blob back to WGSL text.
pub(crate) fn decode_source(name: &str) -> Option<String> {
    let encoded = encoded_source(name)?;
    let compressed = match base64::engine::general_purpose::STANDARD.decode(encoded) {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("shader '{name}': base64 decode failed: {error}");
            return None;
        }
    };
    let bytes = match lz4_flex::decompress_size_prepended(&compressed) {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("shader '{name}': decompression failed: {error}");
            return None;
        }
    };
    match String::from_utf8(bytes) {
        Ok(source) => Some(source),
        Err(error) => {
            tracing::error!("shader '{name}': invalid UTF-8: {error}");
            None
        }
    }
}

/// Decodes, parses and validates one embedded shader.
pub(crate) fn load_shader(name: &str) -> Option<Shader> {
    let source = decode_source(name)?;
    match Shader::from_wgsl(name, &source) {
        Ok(shader) => Some(shader),
        Err(error) => {
            tracing::error!("shader '{name}': {error}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shader_file(name: &str) -> &'static str {
        match name {
            "vertex" => include_str!("../shaders/vertex.wgsl"),
            "stencil" => include_str!("../shaders/stencil.wgsl"),
            "vertex_color" => include_str!("../shaders/vertex_color.wgsl"),
            "image" => include_str!("../shaders/image.wgsl"),
            "rc_image" => include_str!("../shaders/rc_image.wgsl"),
            "resolve_mask" => include_str!("../shaders/resolve_mask.wgsl"),
            "color_matrix" => include_str!("../shaders/color_matrix.wgsl"),
            "blur" => include_str!("../shaders/blur.wgsl"),
            "blend" => include_str!("../shaders/blend.wgsl"),
            _ => unreachable!("unknown shader {name}"),
        }
    }

    #[test]
    fn blobs_match_source_files() {
        for name in SHADER_NAMES {
            let decoded = decode_source(name).expect(name);
            assert_eq!(decoded, shader_file(name), "blob for '{name}' is stale");
        }
    }

    #[test]
    fn every_embedded_shader_validates() {
        for name in SHADER_NAMES {
            let shader = load_shader(name).expect(name);
            assert!(shader.entry_points().count() > 0, "{name} has entry points");
        }
    }

    #[test]
    fn unknown_shader_is_none() {
        assert!(decode_source("nonexistent").is_none());
    }
}
